/// Timezone catalogue
///
/// `GET /v1/timezones` lists the zones a tenant may choose at registration
/// or in settings. Public, so the registration form can be filled before
/// logging in.

use axum::Json;
use taskmate_shared::timezone::SupportedTimezone;

pub async fn list_timezones() -> Json<&'static [SupportedTimezone]> {
    Json(SupportedTimezone::all())
}

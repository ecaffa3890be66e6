/// Tenant settings
///
/// - `GET /v1/settings` - Current tenant timezone
/// - `PUT /v1/settings` - Change it (affects every member of the tenant)

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskmate_shared::{scope::TenantContext, timezone::SupportedTimezone};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub timezone: String,

    /// UTC offset label such as `+09:00`; absent for a zone outside the
    /// supported table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_label: Option<&'static str>,
}

impl SettingsResponse {
    fn new(timezone: String) -> Self {
        let offset_label = SupportedTimezone::lookup(&timezone).map(|tz| tz.offset_label);
        Self {
            timezone,
            offset_label,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SettingsRequest {
    #[validate(length(min = 1, message = "Timezone is required."))]
    pub timezone: String,
}

pub async fn get_settings(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<SettingsResponse>> {
    let timezone = state.scoped(ctx).get_timezone().await?;

    Ok(Json(SettingsResponse::new(timezone)))
}

/// Change the tenant timezone
///
/// # Errors
///
/// - `422 Unprocessable Entity`: zone not in the supported table
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<SettingsRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    req.validate()?;

    let mut store = state.scoped(ctx);
    store.set_timezone(&req.timezone).await?;

    tracing::info!(
        tenant_id = store.context().tenant_id,
        timezone = %req.timezone,
        "Tenant timezone changed"
    );

    Ok(Json(SettingsResponse::new(store.context().timezone.clone())))
}

/// Supported tenant timezones
///
/// Tenants pick their timezone from a fixed table of twenty IANA zone names,
/// each paired with the UTC offset shown to users. Only these names are
/// accepted at registration and in settings.
///
/// Lookups are exact: `"Europe/Paris"` resolves, `"Paris"` and
/// `"europe/paris"` do not.
///
/// Offsets are fixed; daylight saving is not modeled. The tenant's local
/// calendar date (used by the overdue sweep) is `instant + offset`.
///
/// # Example
///
/// ```
/// use taskmate_shared::timezone::SupportedTimezone;
///
/// let tz = SupportedTimezone::lookup("Asia/Tokyo").unwrap();
/// assert_eq!(tz.offset_label, "+09:00");
/// assert!(SupportedTimezone::lookup("Tokyo").is_none());
/// ```

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

/// Zone assigned to tenants created without an explicit choice
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// One entry of the supported timezone table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportedTimezone {
    /// IANA zone identifier, stored on the tenant row
    pub name: &'static str,

    /// Display offset, e.g. `"+01:00"`
    pub offset_label: &'static str,
}

const TIMEZONES: [SupportedTimezone; 20] = [
    tz("Africa/Lagos", "+01:00"),
    tz("Africa/Johannesburg", "+02:00"),
    tz("Africa/Nairobi", "+03:00"),
    tz("America/Buenos_Aires", "-03:00"),
    tz("America/Chicago", "-05:00"),
    tz("America/Los_Angeles", "-08:00"),
    tz("America/New_York", "-04:00"),
    tz("America/Santiago", "-04:00"),
    tz("America/Sao_Paulo", "-03:00"),
    tz("Asia/Dubai", "+04:00"),
    tz("Asia/Perth", "+08:00"),
    tz("Asia/Shanghai", "+08:00"),
    tz("Asia/Tokyo", "+09:00"),
    tz("Australia/Brisbane", "+10:00"),
    tz("Australia/Melbourne", "+10:00"),
    tz("Australia/Perth", "+08:00"),
    tz("Australia/Sydney", "+10:00"),
    tz("Europe/Berlin", "+02:00"),
    tz("Europe/London", "+01:00"),
    tz("Europe/Paris", "+02:00"),
];

const fn tz(name: &'static str, offset_label: &'static str) -> SupportedTimezone {
    SupportedTimezone { name, offset_label }
}

impl SupportedTimezone {
    /// All supported zones in display order
    pub fn all() -> &'static [SupportedTimezone] {
        &TIMEZONES
    }

    /// Exact-key lookup in the table
    pub fn lookup(name: &str) -> Option<&'static SupportedTimezone> {
        TIMEZONES.iter().find(|entry| entry.name == name)
    }

    /// Parses the display label into a chrono offset
    pub fn offset(&self) -> FixedOffset {
        // Labels are compile-time constants of the form "+HH:MM" / "-HH:MM".
        parse_offset(self.offset_label).unwrap_or_else(utc_offset)
    }
}

/// Resolves a stored tenant timezone to its UTC offset
///
/// Accepts any table entry plus the [`DEFAULT_TIMEZONE`] a tenant row gets
/// when none was chosen. Returns `None` for anything else.
pub fn resolve_offset(name: &str) -> Option<FixedOffset> {
    if name == DEFAULT_TIMEZONE {
        return Some(utc_offset());
    }
    SupportedTimezone::lookup(name).map(SupportedTimezone::offset)
}

/// Converts a UTC instant to wall-clock time at the given offset
pub fn to_local(instant: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    instant.with_timezone(&offset)
}

/// Calendar date of `instant` as seen at the given offset
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    to_local(instant, offset).date_naive()
}

/// Zero offset
pub fn utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap_or_else(|| unreachable!("zero offset is always valid"))
}

fn parse_offset(label: &str) -> Option<FixedOffset> {
    let (sign, rest) = match label.as_bytes().first()? {
        b'+' => (1, &label[1..]),
        b'-' => (-1, &label[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_table_has_twenty_unique_entries() {
        let all = SupportedTimezone::all();
        assert_eq!(all.len(), 20);

        let mut names: Vec<&str> = all.iter().map(|tz| tz.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 20);
    }

    #[test]
    fn test_lookup_is_exact() {
        assert!(SupportedTimezone::lookup("Europe/London").is_some());
        assert!(SupportedTimezone::lookup("London").is_none());
        assert!(SupportedTimezone::lookup("Europe").is_none());
        assert!(SupportedTimezone::lookup("europe/london").is_none());
        assert!(SupportedTimezone::lookup("").is_none());
    }

    #[test]
    fn test_utc_is_not_selectable() {
        assert!(SupportedTimezone::lookup(DEFAULT_TIMEZONE).is_none());
        assert_eq!(resolve_offset(DEFAULT_TIMEZONE), FixedOffset::east_opt(0));
    }

    #[test]
    fn test_offsets_parse() {
        let lagos = SupportedTimezone::lookup("Africa/Lagos").unwrap();
        assert_eq!(lagos.offset().local_minus_utc(), 3600);

        let la = SupportedTimezone::lookup("America/Los_Angeles").unwrap();
        assert_eq!(la.offset().local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn test_every_label_parses() {
        for entry in SupportedTimezone::all() {
            assert!(
                parse_offset(entry.offset_label).is_some(),
                "label {} should parse",
                entry.offset_label
            );
        }
    }

    #[test]
    fn test_resolve_offset_rejects_unknown() {
        assert!(resolve_offset("Mars/Olympus_Mons").is_none());
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 20, 30, 0).unwrap();
        let tokyo = SupportedTimezone::lookup("Asia/Tokyo").unwrap().offset();
        let chicago = SupportedTimezone::lookup("America/Chicago").unwrap().offset();

        assert_eq!(
            local_date(instant, tokyo),
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
        assert_eq!(
            local_date(instant, chicago),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }
}

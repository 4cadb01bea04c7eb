use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

#[cfg(test)]
mod timezone_tests {
    use super::get_local_offset;

    #[test]
    fn resolves_canonical_timezone() {
        let offset = get_local_offset("Europe/Istanbul");

        assert!(offset.is_some());
        // Türkiye stays on UTC+3 all year.
        assert_eq!(offset.unwrap().whole_hours(), 3);
    }

    #[test]
    fn returns_none_for_unknown_timezone() {
        assert!(get_local_offset("Mars/Olympus_Mons").is_none());
    }
}

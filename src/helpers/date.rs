//! Date helper functions
//!
//! Content timestamps come from the repository as ISO-8601 strings
//! (`2021-03-25T19:25:28+0000`). Both display formats are total: any input
//! that does not parse renders as an empty string.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::config::SiteConfig;

/// Display locale for dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    PtBr,
}

impl Locale {
    /// Pick a locale from a language tag such as `en` or `pt-BR`
    pub fn from_language(language: &str) -> Self {
        let lang = language.trim().to_ascii_lowercase().replace('_', "-");
        if lang == "pt" || lang.starts_with("pt-") {
            Locale::PtBr
        } else {
            Locale::En
        }
    }

    fn month_abbr(self, month: u32) -> &'static str {
        const EN: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        const PT_BR: [&str; 12] = [
            "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
        ];
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::En => EN[idx],
            Locale::PtBr => PT_BR[idx],
        }
    }
}

/// Formats repository timestamps for display in a fixed locale and time zone
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    locale: Locale,
    tz: Tz,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(Locale::En, chrono_tz::UTC)
    }
}

impl DateFormatter {
    pub fn new(locale: Locale, tz: Tz) -> Self {
        Self { locale, tz }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(Locale::from_language(&config.language), config.tz())
    }

    /// `d MMM yyyy`, e.g. `15 Mar 2021`
    pub fn short(&self, iso: &str) -> String {
        match parse_iso(iso, self.tz) {
            Some(date) => self.day_month_year(&date),
            None => String::new(),
        }
    }

    /// `* edited on d MMM yyyy, at HH:mm`
    pub fn long(&self, iso: &str) -> String {
        let Some(date) = parse_iso(iso, self.tz) else {
            return String::new();
        };
        let day = self.day_month_year(&date);
        let time = format!("{:02}:{:02}", date.hour(), date.minute());
        match self.locale {
            Locale::En => format!("* edited on {}, at {}", day, time),
            Locale::PtBr => format!("* editado em {}, às {}", day, time),
        }
    }

    fn day_month_year(&self, date: &DateTime<Tz>) -> String {
        format!(
            "{} {} {}",
            date.day(),
            self.locale.month_abbr(date.month()),
            date.year()
        )
    }
}

/// Short date in the default locale (English, UTC)
pub fn format_short(iso: &str) -> String {
    DateFormatter::default().short(iso)
}

/// Long "edited" line in the default locale (English, UTC)
pub fn format_long(iso: &str) -> String {
    DateFormatter::default().long(iso)
}

/// Parse an ISO-8601 timestamp into the display time zone.
///
/// Values without an offset are read as wall-clock time in `tz`.
pub fn parse_iso(value: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&tz));
    }

    // Prismic writes offsets without a colon: +0000
    for fmt in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(date) = DateTime::parse_from_str(value, fmt) {
            return Some(date.with_timezone(&tz));
        }
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return tz.from_local_datetime(&naive).earliest();
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short() {
        assert_eq!(format_short("2021-03-15T00:00:00Z"), "15 Mar 2021");
        assert_eq!(format_short("2021-03-25T19:25:28+0000"), "25 Mar 2021");
        assert_eq!(format_short("2021-12-01"), "1 Dec 2021");
    }

    #[test]
    fn test_format_long() {
        assert_eq!(
            format_long("2021-03-25T19:25:28+0000"),
            "* edited on 25 Mar 2021, at 19:25"
        );
        assert_eq!(
            format_long("2021-03-25T09:05:00.123+00:00"),
            "* edited on 25 Mar 2021, at 09:05"
        );
    }

    #[test]
    fn test_invalid_input_is_empty() {
        for input in ["not-a-date", "", "   ", "2021-13-45", "15/03/2021"] {
            assert_eq!(format_short(input), "", "short({input:?})");
            assert_eq!(format_long(input), "", "long({input:?})");
        }
    }

    #[test]
    fn test_pt_br_locale() {
        let fmt = DateFormatter::new(Locale::from_language("pt-BR"), chrono_tz::UTC);
        assert_eq!(fmt.short("2021-03-15T00:00:00Z"), "15 mar 2021");
        assert_eq!(
            fmt.long("2021-02-03T08:30:00+0000"),
            "* editado em 3 fev 2021, às 08:30"
        );
    }

    #[test]
    fn test_timezone_shifts_the_day() {
        let fmt = DateFormatter::new(Locale::En, chrono_tz::America::Sao_Paulo);
        assert_eq!(fmt.short("2021-03-15T00:00:00Z"), "14 Mar 2021");
        assert_eq!(fmt.long("2021-03-15T00:00:00Z"), "* edited on 14 Mar 2021, at 21:00");
    }

    #[test]
    fn test_locale_from_language() {
        assert_eq!(Locale::from_language("en"), Locale::En);
        assert_eq!(Locale::from_language("pt_BR"), Locale::PtBr);
        assert_eq!(Locale::from_language("pt"), Locale::PtBr);
        assert_eq!(Locale::from_language("fr"), Locale::En);
    }
}

use std::fmt;
use std::str::FromStr;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar date, ordered lexicographically by `(year, month, day)` (valid
/// for any Gregorian date since field order matches chronological order).
/// Deliberately a plain value type rather than a full calendar library: the
/// core only ever compares, sorts, and round-trips dates through the
/// history persistence format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl Date {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }
}

impl fmt::Display for Date {
    /// ISO 8601 numeric form, e.g. `2020-01-15`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateParseError(pub String);

impl fmt::Display for DateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid date: {}", self.0)
    }
}

impl std::error::Error for DateParseError {}

impl FromStr for Date {
    type Err = DateParseError;

    /// Accepts `YYYY-MM-DD` (numeric month) and `YYYY-Mon-DD` (three-letter
    /// month name); always prints back in the former.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return Err(DateParseError(s.to_string()));
        }
        let year: i32 = parts[0].parse().map_err(|_| DateParseError(s.to_string()))?;
        let month: u8 = if let Ok(m) = parts[1].parse::<u8>() {
            m
        } else {
            let name = parts[1];
            let pos = MONTH_NAMES
                .iter()
                .position(|&m| m.eq_ignore_ascii_case(name))
                .ok_or_else(|| DateParseError(s.to_string()))?;
            (pos + 1) as u8
        };
        let day: u8 = parts[2].parse().map_err(|_| DateParseError(s.to_string()))?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(DateParseError(s.to_string()));
        }
        Ok(Date::new(year, month, day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_chronologically() {
        let a = Date::new(2020, 1, 15);
        let b = Date::new(2020, 2, 1);
        assert!(a < b);
    }

    #[test]
    fn parses_numeric_and_month_name_forms() {
        assert_eq!("2020-01-15".parse::<Date>().unwrap(), Date::new(2020, 1, 15));
        assert_eq!("2020-Jan-15".parse::<Date>().unwrap(), Date::new(2020, 1, 15));
    }

    #[test]
    fn displays_in_iso_numeric_form() {
        assert_eq!(Date::new(2020, 1, 5).to_string(), "2020-01-05");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("2020/01/15".parse::<Date>().is_err());
        assert!("2020-13-01".parse::<Date>().is_err());
    }
}

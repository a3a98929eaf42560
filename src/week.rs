use chrono::{NaiveDate, Weekday};

/// Which day anchors the weekly log document's date range. Both conventions
/// exist in the wild, so the choice is configuration rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    Monday,
    Sunday,
}

impl Default for WeekStart {
    fn default() -> Self {
        Self::Monday
    }
}

impl WeekStart {
    fn weekday(self) -> Weekday {
        match self {
            Self::Monday => Weekday::Mon,
            Self::Sunday => Weekday::Sun,
        }
    }
}

/// Title of the weekly log document covering `date`: `"MM/DD - MM/DD"` for
/// the 7-day week anchored on `start`.
pub fn label(date: NaiveDate, start: WeekStart) -> String {
    let first = date.week(start.weekday()).first_day();
    let last = first + chrono::Duration::days(6);
    format!("{} - {}", first.format("%m/%d"), last.format("%m/%d"))
}

#[cfg(test)]
mod test {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn should_anchor_on_monday() {
        // 2021-01-06 is a Wednesday.
        assert_eq!(label(date(2021, 1, 6), WeekStart::Monday), "01/04 - 01/10");
    }

    #[test]
    fn should_anchor_on_sunday() {
        assert_eq!(label(date(2021, 1, 6), WeekStart::Sunday), "01/03 - 01/09");
    }

    #[test]
    fn should_keep_anchor_day_itself() {
        assert_eq!(label(date(2021, 1, 4), WeekStart::Monday), "01/04 - 01/10");
        assert_eq!(label(date(2021, 1, 3), WeekStart::Sunday), "01/03 - 01/09");
    }

    #[test]
    fn should_span_month_boundaries() {
        // 2021-03-30 is a Tuesday.
        assert_eq!(label(date(2021, 3, 30), WeekStart::Monday), "03/29 - 04/04");
    }
}

//! Query-string filters for the dashboard, category pages and CSV export.
//!
//! Filters are AND-composed: a transaction is shown when every active part of
//! the filter matches. Unknown values are treated as "all" so that stale links
//! keep working instead of failing the whole page.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, UtcOffset};

use crate::transaction::{Transaction, TransactionKind};

/// Restricts the transaction list to a rolling period relative to today.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PeriodFilter {
    #[default]
    All,
    /// The current ISO week (Monday through Sunday).
    Week,
    /// The current calendar month.
    Month,
    /// The current calendar year.
    Year,
}

impl PeriodFilter {
    fn as_str(self) -> &'static str {
        match self {
            PeriodFilter::All => "all",
            PeriodFilter::Week => "week",
            PeriodFilter::Month => "month",
            PeriodFilter::Year => "year",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "week" => PeriodFilter::Week,
            "month" => PeriodFilter::Month,
            "year" => PeriodFilter::Year,
            _ => PeriodFilter::All,
        }
    }
}

/// Restricts the transaction list to a specific calendar month, in any year.
///
/// Months are zero-based on the wire: 0 is January, 11 is December.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MonthFilter {
    #[default]
    All,
    Month(u8),
}

impl MonthFilter {
    fn parse(value: &str) -> Self {
        match value.parse::<u8>() {
            Ok(month) if month <= 11 => MonthFilter::Month(month),
            _ => MonthFilter::All,
        }
    }
}

/// Restricts the transaction list to a specific calendar year.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    fn parse(value: &str) -> Self {
        match value.parse::<i32>() {
            Ok(year) => YearFilter::Year(year),
            Err(_) => YearFilter::All,
        }
    }
}

/// Restricts the transaction list to income or expenses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl KindFilter {
    fn as_str(self) -> &'static str {
        match self {
            KindFilter::All => "all",
            KindFilter::Income => "income",
            KindFilter::Expense => "expense",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "income" => KindFilter::Income,
            "expense" => KindFilter::Expense,
            _ => KindFilter::All,
        }
    }
}

/// The complete filter state, parsed from and serialized to the query string.
///
/// The default filter shows everything.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default, with = "period_filter")]
    pub period: PeriodFilter,
    #[serde(default, with = "month_filter")]
    pub month: MonthFilter,
    #[serde(default, with = "year_filter")]
    pub year: YearFilter,
    #[serde(default, rename = "type", with = "kind_filter")]
    pub kind: KindFilter,
}

impl FilterSpec {
    /// Whether `transaction` passes every part of the filter.
    ///
    /// `today` and dates are compared in the local timezone, so a transaction
    /// recorded late at night counts towards the day the user saw.
    pub fn matches(&self, transaction: &Transaction, today: Date, local_offset: UtcOffset) -> bool {
        let date = transaction.date.to_offset(local_offset).date();

        self.matches_period(date, today)
            && self.matches_month(date)
            && self.matches_year(date)
            && self.matches_kind(transaction.kind)
    }

    /// Keep only the transactions that pass the filter, preserving order.
    pub fn apply(
        &self,
        transactions: Vec<Transaction>,
        today: Date,
        local_offset: UtcOffset,
    ) -> Vec<Transaction> {
        transactions
            .into_iter()
            .filter(|transaction| self.matches(transaction, today, local_offset))
            .collect()
    }

    /// The filter as a query string, e.g. `period=month&type=income`, with
    /// "all" parts omitted. Returns an empty string for the default filter.
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();

        if self.period != PeriodFilter::All {
            parts.push(format!("period={}", self.period.as_str()));
        }

        if let MonthFilter::Month(month) = self.month {
            parts.push(format!("month={month}"));
        }

        if let YearFilter::Year(year) = self.year {
            parts.push(format!("year={year}"));
        }

        if self.kind != KindFilter::All {
            parts.push(format!("type={}", self.kind.as_str()));
        }

        parts.join("&")
    }

    fn matches_period(&self, date: Date, today: Date) -> bool {
        match self.period {
            PeriodFilter::All => true,
            PeriodFilter::Week => {
                let (year, week, _) = date.to_iso_week_date();
                let (today_year, today_week, _) = today.to_iso_week_date();
                (year, week) == (today_year, today_week)
            }
            PeriodFilter::Month => date.year() == today.year() && date.month() == today.month(),
            PeriodFilter::Year => date.year() == today.year(),
        }
    }

    fn matches_month(&self, date: Date) -> bool {
        match self.month {
            MonthFilter::All => true,
            MonthFilter::Month(month) => date.month() as u8 - 1 == month,
        }
    }

    fn matches_year(&self, date: Date) -> bool {
        match self.year {
            YearFilter::All => true,
            YearFilter::Year(year) => date.year() == year,
        }
    }

    fn matches_kind(&self, kind: TransactionKind) -> bool {
        match self.kind {
            KindFilter::All => true,
            KindFilter::Income => kind == TransactionKind::Income,
            KindFilter::Expense => kind == TransactionKind::Expense,
        }
    }
}

// Query strings carry every value as text, so each filter part is
// (de)serialized through its string form.
macro_rules! filter_serde {
    ($module:ident, $type:ty, $to_string:expr) => {
        mod $module {
            use super::*;

            pub fn serialize<S: Serializer>(value: &$type, serializer: S) -> Result<S::Ok, S::Error> {
                let to_string: fn(&$type) -> String = $to_string;
                serializer.serialize_str(&to_string(value))
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<$type, D::Error> {
                let value = String::deserialize(deserializer)?;
                Ok(<$type>::parse(&value))
            }
        }
    };
}

filter_serde!(period_filter, PeriodFilter, |period| period
    .as_str()
    .to_owned());
filter_serde!(month_filter, MonthFilter, |month| match month {
    MonthFilter::All => "all".to_owned(),
    MonthFilter::Month(month) => month.to_string(),
});
filter_serde!(year_filter, YearFilter, |year| match year {
    YearFilter::All => "all".to_owned(),
    YearFilter::Year(year) => year.to_string(),
});
filter_serde!(kind_filter, KindFilter, |kind| kind.as_str().to_owned());

#[cfg(test)]
mod filter_tests {
    use time::{Date, OffsetDateTime, UtcOffset, macros::date};

    use super::{FilterSpec, KindFilter, MonthFilter, PeriodFilter, YearFilter};
    use crate::transaction::{Transaction, TransactionKind};

    fn transaction_on(date: Date, kind: TransactionKind) -> Transaction {
        Transaction {
            id: 1,
            amount: 10.0,
            kind,
            category_id: 1,
            description: "test".to_owned(),
            donor: None,
            date: OffsetDateTime::new_utc(date, time::Time::MIDNIGHT),
        }
    }

    fn matches(filter: FilterSpec, transaction_date: Date, today: Date) -> bool {
        filter.matches(
            &transaction_on(transaction_date, TransactionKind::Income),
            today,
            UtcOffset::UTC,
        )
    }

    #[test]
    fn default_filter_matches_everything() {
        let filter = FilterSpec::default();

        assert!(matches(filter, date!(1999 - 01 - 01), date!(2025 - 10 - 27)));
    }

    #[test]
    fn week_filter_uses_iso_weeks() {
        let filter = FilterSpec {
            period: PeriodFilter::Week,
            ..Default::default()
        };
        // Monday and Sunday of the same ISO week.
        let monday = date!(2025 - 10 - 27);
        let sunday = date!(2025 - 11 - 02);

        assert!(matches(filter, monday, sunday));
        assert!(matches(filter, sunday, monday));
        // The previous Sunday belongs to the week before.
        assert!(!matches(filter, date!(2025 - 10 - 26), monday));
    }

    #[test]
    fn week_filter_handles_year_boundary() {
        let filter = FilterSpec {
            period: PeriodFilter::Week,
            ..Default::default()
        };

        // 2025-12-29 (Monday) and 2026-01-04 (Sunday) share ISO week 1 of 2026.
        assert!(matches(filter, date!(2025 - 12 - 29), date!(2026 - 01 - 04)));
        assert!(!matches(filter, date!(2025 - 12 - 28), date!(2026 - 01 - 04)));
    }

    #[test]
    fn month_period_requires_same_year() {
        let filter = FilterSpec {
            period: PeriodFilter::Month,
            ..Default::default()
        };

        assert!(matches(filter, date!(2025 - 10 - 01), date!(2025 - 10 - 31)));
        assert!(!matches(filter, date!(2024 - 10 - 15), date!(2025 - 10 - 31)));
    }

    #[test]
    fn explicit_month_is_zero_based_and_ignores_year() {
        let filter = FilterSpec {
            month: MonthFilter::Month(0),
            ..Default::default()
        };

        assert!(matches(filter, date!(2024 - 01 - 15), date!(2025 - 10 - 27)));
        assert!(matches(filter, date!(2025 - 01 - 15), date!(2025 - 10 - 27)));
        assert!(!matches(filter, date!(2025 - 02 - 15), date!(2025 - 10 - 27)));
    }

    #[test]
    fn kind_filter_excludes_other_kind() {
        let filter = FilterSpec {
            kind: KindFilter::Expense,
            ..Default::default()
        };
        let today = date!(2025 - 10 - 27);

        let expense = transaction_on(today, TransactionKind::Expense);
        let income = transaction_on(today, TransactionKind::Income);

        assert!(filter.matches(&expense, today, UtcOffset::UTC));
        assert!(!filter.matches(&income, today, UtcOffset::UTC));
    }

    #[test]
    fn filters_are_and_composed() {
        let filter = FilterSpec {
            month: MonthFilter::Month(9),
            year: YearFilter::Year(2025),
            kind: KindFilter::Income,
            ..Default::default()
        };
        let today = date!(2025 - 10 - 27);

        let matching = transaction_on(date!(2025 - 10 - 05), TransactionKind::Income);
        let wrong_year = transaction_on(date!(2024 - 10 - 05), TransactionKind::Income);
        let wrong_kind = transaction_on(date!(2025 - 10 - 05), TransactionKind::Expense);

        assert!(filter.matches(&matching, today, UtcOffset::UTC));
        assert!(!filter.matches(&wrong_year, today, UtcOffset::UTC));
        assert!(!filter.matches(&wrong_kind, today, UtcOffset::UTC));
    }

    #[test]
    fn parses_query_string() {
        let filter: FilterSpec =
            serde_urlencoded::from_str("period=month&month=3&year=2025&type=income").unwrap();

        assert_eq!(
            filter,
            FilterSpec {
                period: PeriodFilter::Month,
                month: MonthFilter::Month(3),
                year: YearFilter::Year(2025),
                kind: KindFilter::Income,
            }
        );
    }

    #[test]
    fn unknown_values_fall_back_to_all() {
        let filter: FilterSpec =
            serde_urlencoded::from_str("period=fortnight&month=12&year=notayear&type=both")
                .unwrap();

        assert_eq!(filter, FilterSpec::default());
    }

    #[test]
    fn missing_parameters_default_to_all() {
        let filter: FilterSpec = serde_urlencoded::from_str("").unwrap();

        assert_eq!(filter, FilterSpec::default());
    }

    #[test]
    fn query_string_omits_all_parts() {
        assert_eq!(FilterSpec::default().to_query_string(), "");

        let filter = FilterSpec {
            period: PeriodFilter::Week,
            kind: KindFilter::Expense,
            ..Default::default()
        };
        assert_eq!(filter.to_query_string(), "period=week&type=expense");
    }
}

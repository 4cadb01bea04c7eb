//! Dashboard module
//!
//! Provides the home page showing filtered totals, charts, the per-category
//! breakdown, the entry forms and the transaction list.

mod aggregation;
mod charts;
mod handlers;
mod tables;

pub use aggregation::{
    CategoryBreakdownRow, Totals, observed_years, per_category_breakdown, sort_by_date_descending,
    totals,
};
pub use handlers::{DashboardState, get_dashboard_page};
pub(crate) use tables::transaction_table;

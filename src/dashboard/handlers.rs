//! Dashboard HTTP handlers and view rendering.
//!
//! The dashboard is the home page: it shows the filtered totals, charts, the
//! per-category breakdown, the entry forms and the transaction list. Each
//! request bulk loads the full store and filters in memory.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error,
    category::{Category, get_all_categories, new_category_form},
    dashboard::{
        aggregation::{
            CategoryBreakdownRow, Totals, observed_years, per_category_breakdown,
            sort_by_date_descending, totals,
        },
        charts::{DashboardChart, category_chart, charts_script, charts_view, income_expense_chart},
        tables::{breakdown_table, totals_cards, transaction_table},
    },
    endpoints,
    filter::{FilterSpec, KindFilter, MonthFilter, PeriodFilter, YearFilter},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, LINK_STYLE,
        base, lira_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::get_local_offset,
    transaction::{
        Transaction, TransactionFormDefaults, TransactionKind, get_all_transactions,
        transaction_form_fields,
    },
};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for managing transactions and categories.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Istanbul".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the dashboard with the transaction list filtered by the query string.
///
/// A failed bulk load is logged and rendered as an empty store so the page
/// stays usable.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Query(filter): Query<FilterSpec>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let categories = get_all_categories(&connection).unwrap_or_else(|error| {
        tracing::error!("could not load categories, rendering empty list: {error}");
        Vec::new()
    });
    let transactions = get_all_transactions(&connection).unwrap_or_else(|error| {
        tracing::error!("could not load transactions, rendering empty list: {error}");
        Vec::new()
    });

    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();
    let years = observed_years(&transactions, local_offset);

    let mut filtered = filter.apply(transactions, today, local_offset);
    let totals = totals(&filtered);
    let breakdown = per_category_breakdown(&filtered, &categories);
    sort_by_date_descending(&mut filtered);

    dashboard_view(
        &filter,
        &years,
        &totals,
        &breakdown,
        &filtered,
        &categories,
        local_offset,
    )
    .into_response()
}

fn dashboard_view(
    filter: &FilterSpec,
    years: &[i32],
    totals: &Totals,
    breakdown: &[CategoryBreakdownRow],
    transactions: &[Transaction],
    categories: &[Category],
    local_offset: UtcOffset,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROOT).into_html();
    let charts = [
        DashboardChart {
            id: "category-chart",
            options: category_chart(breakdown).to_string(),
        },
        DashboardChart {
            id: "income-expense-chart",
            options: income_expense_chart(totals).to_string(),
        },
    ];
    let show_charts = !transactions.is_empty();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (filter_form(filter, years))

            (totals_cards(totals))

            @if show_charts {
                (charts_view(&charts))
            }

            (breakdown_table(breakdown))

            div class="w-full grid grid-cols-1 lg:grid-cols-2 gap-8 mb-8"
            {
                (new_transaction_form(categories))

                (new_category_form())
            }

            section class="w-full"
            {
                div class="flex justify-between items-baseline mb-4"
                {
                    h3 class="text-xl font-semibold" { "Transactions" }

                    (export_link(filter))
                }

                (transaction_table(transactions, categories, local_offset))
            }
        }
    );

    let mut head_elements = vec![lira_input_styles()];

    if show_charts {
        head_elements.push(HeadElement::ScriptLink(
            "/static/echarts.6.0.0.min.js".to_owned(),
        ));
        head_elements.push(charts_script(&charts));
    }

    base("Dashboard", &head_elements, &content)
}

/// The filter controls. Changing any select makes htmx re-request the
/// dashboard with the new query string and swap in the fresh page.
fn filter_form(filter: &FilterSpec, years: &[i32]) -> Markup {
    let select_style = format!("{FORM_TEXT_INPUT_STYLE} w-auto");

    let period_options = [
        (PeriodFilter::All, "all", "All time"),
        (PeriodFilter::Week, "week", "This week"),
        (PeriodFilter::Month, "month", "This month"),
        (PeriodFilter::Year, "year", "This year"),
    ];
    let kind_options = [
        (KindFilter::All, "all", "All"),
        (KindFilter::Income, "income", "Income"),
        (KindFilter::Expense, "expense", "Expense"),
    ];

    html! {
        form
            hx-get=(endpoints::ROOT)
            hx-trigger="change"
            hx-target="body"
            hx-push-url="true"
            class="w-full flex flex-wrap items-end gap-4 mb-6"
        {
            div
            {
                label for="period" class=(FORM_LABEL_STYLE) { "Period" }

                select name="period" id="period" class=(select_style)
                {
                    @for (option, value, label) in period_options {
                        option value=(value) selected[filter.period == option] { (label) }
                    }
                }
            }

            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }

                select name="month" id="month" class=(select_style)
                {
                    option value="all" selected[filter.month == MonthFilter::All] { "All" }

                    @for (index, name) in MONTH_NAMES.iter().enumerate() {
                        option
                            value=(index)
                            selected[filter.month == MonthFilter::Month(index as u8)]
                        {
                            (name)
                        }
                    }
                }
            }

            div
            {
                label for="year" class=(FORM_LABEL_STYLE) { "Year" }

                select name="year" id="year" class=(select_style)
                {
                    option value="all" selected[filter.year == YearFilter::All] { "All" }

                    @for year in years {
                        option value=(year) selected[filter.year == YearFilter::Year(*year)] { (year) }
                    }
                }
            }

            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }

                select name="type" id="type" class=(select_style)
                {
                    @for (option, value, label) in kind_options {
                        option value=(value) selected[filter.kind == option] { (label) }
                    }
                }
            }
        }
    }
}

/// A download link for the filtered transaction list as CSV.
fn export_link(filter: &FilterSpec) -> Markup {
    let query = filter.to_query_string();
    let href = if query.is_empty() {
        endpoints::EXPORT.to_owned()
    } else {
        format!("{}?{query}", endpoints::EXPORT)
    };

    html! {
        a href=(href) class=(LINK_STYLE) download { "Export CSV" }
    }
}

/// The entry form for a new transaction.
fn new_transaction_form(categories: &[Category]) -> Markup {
    let defaults = TransactionFormDefaults {
        kind: TransactionKind::Expense,
        amount: None,
        description: None,
        category_id: None,
        donor: None,
        autofocus_amount: false,
    };

    html! {
        div
        {
            h2 class="text-xl font-bold mb-4" { "New Transaction" }

            form
                class="space-y-4"
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-target-error="#alert-container"
            {
                (transaction_form_fields(&defaults, categories))

                button
                    type="submit"
                    class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" { (loading_spinner()) }
                    "Add transaction"
                }
            }
        }
    }
}

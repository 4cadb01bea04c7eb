//! The detail page for a single category.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::UtcOffset;

use crate::{
    AppState, Error,
    category::{Category, CategoryId, CategoryKind, get_category},
    dashboard::{Totals, sort_by_date_descending, totals, transaction_table},
    endpoints,
    html::{EXPENSE_BADGE_STYLE, INCOME_BADGE_STYLE, base, currency_rounded_with_tooltip},
    internal_server_error::render_internal_server_error,
    navigation::NavBar,
    not_found::get_404_not_found_response,
    timezone::get_local_offset,
    transaction::{Transaction, get_transactions_for_category},
};

/// The state needed for the category detail page.
#[derive(Debug, Clone)]
pub struct CategoryDetailPageState {
    /// The local timezone as a canonical timezone name, e.g. "Europe/Istanbul".
    pub local_timezone: String,
    /// The database connection for accessing categories and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryDetailPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the detail page for a category: its totals and all of its
/// transactions, newest first.
pub async fn get_category_detail_page(
    State(state): State<CategoryDetailPageState>,
    Path(category_id): Path<CategoryId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let category = match get_category(category_id, &connection) {
        Ok(category) => category,
        Err(Error::NotFound) => {
            return get_404_not_found_response();
        }
        Err(error) => {
            tracing::error!("Failed to retrieve category {category_id}: {error}");
            return render_internal_server_error(Default::default());
        }
    };

    let mut transactions = match get_transactions_for_category(category_id, &connection) {
        Ok(transactions) => transactions,
        Err(error) => {
            tracing::error!("Failed to retrieve transactions for category {category_id}: {error}");
            return render_internal_server_error(Default::default());
        }
    };

    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let totals = totals(&transactions);
    sort_by_date_descending(&mut transactions);

    let content = category_detail_view(&category, &totals, &transactions, local_offset);

    base(category.name.as_ref(), &[], &content).into_response()
}

fn category_detail_view(
    category: &Category,
    totals: &Totals,
    transactions: &[Transaction],
    local_offset: UtcOffset,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORY_VIEW).into_html();
    let categories = std::slice::from_ref(category);

    html! {
        (nav_bar)

        div class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
            max-w-screen-xl text-gray-900 dark:text-white"
        {
            div class="w-full flex items-center gap-3 mb-6"
            {
                h1 class="text-2xl font-bold" { (category.name) }

                @match category.kind {
                    Some(CategoryKind::Income) => { span class=(INCOME_BADGE_STYLE) { "Income" } }
                    Some(CategoryKind::Expense) => { span class=(EXPENSE_BADGE_STYLE) { "Expense" } }
                    None => {}
                }
            }

            div class="w-full grid grid-cols-1 sm:grid-cols-2 gap-4 mb-6"
            {
                div class="bg-white dark:bg-gray-800 border border-gray-200 dark:border-gray-700 rounded-lg p-4 shadow-md"
                {
                    h3 class="text-sm font-semibold text-gray-500 dark:text-gray-400 uppercase" { "Income" }
                    p class="mt-2 text-2xl font-bold text-green-600 dark:text-green-400"
                    {
                        (currency_rounded_with_tooltip(totals.income))
                    }
                }

                div class="bg-white dark:bg-gray-800 border border-gray-200 dark:border-gray-700 rounded-lg p-4 shadow-md"
                {
                    h3 class="text-sm font-semibold text-gray-500 dark:text-gray-400 uppercase" { "Expenses" }
                    p class="mt-2 text-2xl font-bold text-red-600 dark:text-red-400"
                    {
                        (currency_rounded_with_tooltip(totals.expense))
                    }
                }
            }

            section class="w-full"
            {
                h3 class="text-xl font-semibold mb-4" { "Transactions" }

                (transaction_table(transactions, categories, local_offset))
            }
        }
    }
}

#[cfg(test)]
mod category_detail_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use scraper::Selector;

    use super::{CategoryDetailPageState, get_category_detail_page};
    use crate::{
        category::{CategoryKind, CategoryName, create_category},
        db::initialize,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{TransactionBuilder, TransactionKind, create_transaction},
    };

    fn get_test_state() -> CategoryDetailPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        CategoryDetailPageState {
            local_timezone: "Europe/Istanbul".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn shows_only_this_categorys_transactions() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_category(
                CategoryName::new_unchecked("Kira"),
                CategoryKind::Expense,
                &connection,
            )
            .unwrap();
            create_category(
                CategoryName::new_unchecked("Maaş"),
                CategoryKind::Income,
                &connection,
            )
            .unwrap();
            create_transaction(
                TransactionBuilder {
                    amount: 300.0,
                    kind: TransactionKind::Expense,
                    category_id: 1,
                    description: "Ekim kirası".to_owned(),
                    donor: None,
                },
                &connection,
            )
            .unwrap();
            create_transaction(
                TransactionBuilder {
                    amount: 1000.0,
                    kind: TransactionKind::Income,
                    category_id: 2,
                    description: "Eylül maaşı".to_owned(),
                    donor: None,
                },
                &connection,
            )
            .unwrap();
        }

        let response = get_category_detail_page(State(state), Path(1)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let row_selector = Selector::parse("tr[data-transaction-row='true']").unwrap();
        assert_eq!(document.select(&row_selector).count(), 1);
        assert!(document.html().contains("Ekim kirası"));
        assert!(!document.html().contains("Eylül maaşı"));
        assert!(document.html().contains("₺300.00"));
    }

    #[tokio::test]
    async fn missing_category_returns_not_found() {
        let state = get_test_state();

        let response = get_category_detail_page(State(state), Path(999)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn poisoned_database_lock_renders_an_error_page() {
        let state = get_test_state();
        let db_connection = state.db_connection.clone();
        std::thread::spawn(move || {
            let _guard = db_connection.lock().unwrap();
            panic!("poison the database lock");
        })
        .join()
        .unwrap_err();

        let response = get_category_detail_page(State(state), Path(1)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

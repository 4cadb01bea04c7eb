//! The page for editing an existing transaction.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    database_id::TransactionID,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        lira_input_styles, loading_spinner,
    },
    internal_server_error::render_internal_server_error,
    navigation::NavBar,
    not_found::get_404_not_found_response,
    timezone::get_local_offset,
    transaction::{
        Transaction,
        core::get_transaction,
        form::{TransactionFormDefaults, transaction_form_fields},
    },
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Europe/Istanbul".
    pub local_timezone: String,
    /// The database connection for accessing transactions and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[day]/[month]/[year]");

/// Renders the page for editing a transaction.
///
/// The creation date is displayed but cannot be changed.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Path(transaction_id): Path<TransactionID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let transaction = match get_transaction(transaction_id, &connection) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => {
            return get_404_not_found_response();
        }
        Err(error) => {
            tracing::error!("Failed to retrieve transaction {transaction_id}: {error}");
            return render_internal_server_error(Default::default());
        }
    };

    let available_categories = match get_all_categories(&connection) {
        Ok(categories) => categories,
        Err(error) => {
            tracing::error!("Failed to retrieve categories for edit transaction page: {error}");
            return render_internal_server_error(Default::default());
        }
    };

    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let created_on = transaction
        .date
        .to_offset(local_offset)
        .format(DATE_FORMAT)
        .unwrap_or_else(|_| transaction.date.to_string());

    let content = edit_transaction_view(&transaction, &created_on, available_categories);

    base("Edit Transaction", &[lira_input_styles()], &content).into_response()
}

fn edit_transaction_view(
    transaction: &Transaction,
    created_on: &str,
    available_categories: Vec<Category>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION_VIEW).into_html();

    let defaults = TransactionFormDefaults {
        kind: transaction.kind,
        amount: Some(transaction.amount),
        description: Some(&transaction.description),
        category_id: Some(transaction.category_id),
        donor: transaction.donor.as_deref(),
        autofocus_amount: true,
    };

    html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Transaction" }

            form
                class="space-y-4 w-full"
                hx-put=(format_endpoint(endpoints::TRANSACTION, transaction.id))
                hx-target-error="#alert-container"
            {
                div
                {
                    label class=(FORM_LABEL_STYLE) { "Created on" }

                    input
                        type="text"
                        value=(created_on)
                        disabled
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (transaction_form_fields(&defaults, &available_categories))

                button
                    type="submit"
                    class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" { (loading_spinner()) }
                    "Save changes"
                }
            }
        }
    }
}

#[cfg(test)]
mod edit_transaction_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        category::{CategoryKind, CategoryName, create_category},
        db::initialize,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{
            TransactionBuilder, TransactionKind, create_transaction,
            edit_page::{EditTransactionPageState, get_edit_transaction_page},
        },
    };

    fn get_test_state() -> EditTransactionPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        EditTransactionPageState {
            local_timezone: "Europe/Istanbul".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn renders_form_with_existing_values() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_category(
                CategoryName::new_unchecked("Kira"),
                CategoryKind::Expense,
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
        }

        let response = get_edit_transaction_page(State(state), Path(1)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let amount_selector = Selector::parse("input[name=amount]").unwrap();
        let amount = document
            .select(&amount_selector)
            .next()
            .expect("expected an amount input");
        assert_eq!(amount.value().attr("value"), Some("300.00"));

        let description_selector = Selector::parse("input[name=description]").unwrap();
        let description = document
            .select(&description_selector)
            .next()
            .expect("expected a description input");
        assert_eq!(description.value().attr("value"), Some("Ekim kirası"));

        // The creation date is shown but not editable.
        let disabled_selector = Selector::parse("input[disabled]").unwrap();
        assert_eq!(document.select(&disabled_selector).count(), 1);
        let date_selector = Selector::parse("input[name=date]").unwrap();
        assert_eq!(document.select(&date_selector).count(), 0);
    }

    #[tokio::test]
    async fn missing_transaction_returns_not_found() {
        let state = get_test_state();

        let response = get_edit_transaction_page(State(state), Path(999)).await;

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

        let response = get_edit_transaction_page(State(state), Path(1)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

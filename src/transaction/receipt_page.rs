//! The printable donation receipt for a single transaction.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::{
    AppState, Error,
    category::get_category,
    database_id::TransactionID,
    html::{BUTTON_PRIMARY_STYLE, HeadElement, base, format_currency},
    internal_server_error::render_internal_server_error,
    not_found::get_404_not_found_response,
    timezone::get_local_offset,
    transaction::{Transaction, core::get_transaction},
};

/// Shown in place of the donor name when none was recorded.
const ANONYMOUS_DONOR: &str = "Sayın Bağışçı";

const RECEIPT_DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[day]/[month]/[year]");

/// The state needed for the donation receipt page.
#[derive(Debug, Clone)]
pub struct ReceiptPageState {
    /// The local timezone as a canonical timezone name, e.g. "Europe/Istanbul".
    pub local_timezone: String,
    /// The database connection for accessing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReceiptPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the printable receipt for a transaction.
pub async fn get_receipt_page(
    State(state): State<ReceiptPageState>,
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

    // The category reference may dangle, the receipt still renders.
    let category_name = match get_category(transaction.category_id, &connection) {
        Ok(category) => category.name.to_string(),
        Err(Error::NotFound) => "—".to_owned(),
        Err(error) => {
            tracing::error!(
                "Failed to retrieve category {} for receipt: {error}",
                transaction.category_id
            );
            return render_internal_server_error(Default::default());
        }
    };

    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let date = transaction
        .date
        .to_offset(local_offset)
        .format(RECEIPT_DATE_FORMAT)
        .unwrap_or_else(|_| transaction.date.to_string());

    let content = receipt_view(&transaction, &category_name, &date);

    base("Bağış Makbuzu", &[print_styles()], &content).into_response()
}

fn receipt_view(transaction: &Transaction, category_name: &str, date: &str) -> Markup {
    let donor = transaction.donor.as_deref().unwrap_or(ANONYMOUS_DONOR);

    html! {
        div class="flex flex-col items-center px-6 py-8 mx-auto max-w-lg text-gray-900 dark:text-white"
        {
            div
                id="receipt"
                class="w-full bg-white dark:bg-gray-800 border border-gray-300 dark:border-gray-600 rounded p-8"
            {
                h1 class="text-2xl font-bold text-center tracking-widest mb-6" { "BAĞIŞ MAKBUZU" }

                dl class="space-y-3"
                {
                    (receipt_row("Bağışçı", donor))
                    (receipt_row("Tutar", &format_currency(transaction.amount)))
                    (receipt_row("Tarih", date))
                    (receipt_row("Kategori", category_name))

                    @if !transaction.description.is_empty() {
                        (receipt_row("Açıklama", &transaction.description))
                    }
                }

                p class="mt-8 text-sm text-center text-gray-500 dark:text-gray-400"
                {
                    "Bağışınız için teşekkür ederiz."
                }
            }

            button
                type="button"
                onclick="window.print()"
                class=(BUTTON_PRIMARY_STYLE)
                style="margin-top: 1.5rem; max-width: 12rem;"
            {
                "Yazdır"
            }
        }
    }
}

fn receipt_row(label: &str, value: &str) -> Markup {
    html! {
        div class="flex justify-between gap-4 border-b border-dashed border-gray-300 dark:border-gray-600 pb-2"
        {
            dt class="font-medium" { (label) }
            dd { (value) }
        }
    }
}

// Hide everything except the receipt itself when printing.
fn print_styles() -> HeadElement {
    HeadElement::Style(PreEscaped(
        r#"
        @media print {
            body * {
                visibility: hidden;
            }

            #receipt, #receipt * {
                visibility: visible;
            }

            #receipt {
                position: absolute;
                left: 0;
                top: 0;
                width: 100%;
                border: none;
            }
        }
        "#
        .to_owned(),
    ))
}

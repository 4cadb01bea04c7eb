//! CSV export of the filtered transaction list.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::{OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    dashboard::sort_by_date_descending,
    filter::FilterSpec,
    timezone::get_local_offset,
    transaction::{Transaction, get_all_transactions},
};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// The state needed for the CSV export.
#[derive(Debug, Clone)]
pub struct ExportState {
    /// The local timezone as a canonical timezone name, e.g. "Europe/Istanbul".
    pub local_timezone: String,
    /// The database connection for accessing transactions and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that downloads the filtered transaction list as a CSV
/// file, applying the same query-string filter as the dashboard.
pub async fn export_transactions(
    State(state): State<ExportState>,
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

    let transactions = match get_all_transactions(&connection) {
        Ok(transactions) => transactions,
        Err(error) => {
            tracing::error!("could not load transactions for export: {error}");
            return error.into_alert_response();
        }
    };
    let categories = match get_all_categories(&connection) {
        Ok(categories) => categories,
        Err(error) => {
            tracing::error!("could not load categories for export: {error}");
            return error.into_alert_response();
        }
    };

    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();
    let mut filtered = filter.apply(transactions, today, local_offset);
    sort_by_date_descending(&mut filtered);

    let csv = match write_csv(&filtered, &categories, local_offset) {
        Ok(csv) => csv,
        Err(error) => {
            tracing::error!("could not write CSV export: {error}");
            return error.into_alert_response();
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"transactions.csv\""),
    );

    (StatusCode::OK, headers, csv).into_response()
}

/// Writes the transactions as CSV, resolving category names where the
/// category still exists.
fn write_csv(
    transactions: &[Transaction],
    categories: &[Category],
    local_offset: UtcOffset,
) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["date", "type", "category", "description", "donor", "amount"])
        .map_err(|error| Error::ExportError(error.to_string()))?;

    for transaction in transactions {
        let date = transaction
            .date
            .to_offset(local_offset)
            .format(DATE_FORMAT)
            .map_err(|error| Error::ExportError(error.to_string()))?;
        let category_name = categories
            .iter()
            .find(|category| category.id == transaction.category_id)
            .map(|category| category.name.as_ref())
            .unwrap_or("");

        writer
            .write_record([
                date.as_str(),
                transaction.kind.as_str(),
                category_name,
                transaction.description.as_str(),
                transaction.donor.as_deref().unwrap_or(""),
                &transaction.amount.to_string(),
            ])
            .map_err(|error| Error::ExportError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::ExportError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::ExportError(error.to_string()))
}

//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    category::{Category, CategoryId, get_category},
    transaction::{TransactionKind, core::TransactionBuilder, core::create_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The value of the transaction in lira.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The ID of the category for this transaction.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Text detailing the transaction.
    pub description: String,
    /// The donor's name, only valid for the donation category.
    #[serde(default)]
    pub donor: Option<String>,
}

/// A route handler for creating a new transaction, redirects to the dashboard on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let category = match get_form_category(form.category_id, &connection) {
        Ok(category) => category,
        Err(error) => return error.into_alert_response(),
    };

    let donor = form.donor.filter(|donor| !donor.trim().is_empty());

    if donor.is_some() && !category.is_donation() {
        return Error::DonorNotAllowed.into_alert_response();
    }

    let transaction = TransactionBuilder {
        amount: form.amount,
        kind: form.kind,
        category_id: category.id,
        description: form.description,
        donor,
    };

    if let Err(error) = create_transaction(transaction, &connection) {
        tracing::error!("could not create transaction: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::ROOT.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// New transactions must reference a category that exists, even though the
/// reference is allowed to dangle later.
fn get_form_category(
    category_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<Category, Error> {
    let Some(category_id) = category_id else {
        return Err(Error::InvalidCategory(None));
    };

    get_category(category_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCategory(Some(category_id)),
        error => error,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{body::Body, extract::State, http::Response, response::IntoResponse};
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;

    use crate::{
        category::{CategoryKind, CategoryName, create_category},
        db::initialize,
        endpoints,
        transaction::{
            TransactionKind,
            create_endpoint::{CreateTransactionState, TransactionForm},
            create_transaction_endpoint, get_transaction,
        },
    };

    fn get_test_state() -> CreateTransactionState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn form(amount: f64, category_id: Option<i64>, donor: Option<&str>) -> TransactionForm {
        TransactionForm {
            amount,
            kind: TransactionKind::Income,
            category_id,
            description: "test transaction".to_string(),
            donor: donor.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let state = get_test_state();
        create_category(
            CategoryName::new_unchecked("Maaş"),
            CategoryKind::Income,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = create_transaction_endpoint(State(state.clone()), Form(form(12.3, Some(1), None)))
            .await
            .into_response();

        assert_redirects_to_dashboard(response);

        // We know the first transaction will have ID 1
        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, &connection).unwrap();
        assert_eq!(transaction.amount, 12.3);
        assert_eq!(transaction.description, "test transaction");
        assert_eq!(transaction.category_id, 1);
    }

    #[tokio::test]
    async fn create_fails_without_category() {
        let state = get_test_state();

        let response = create_transaction_endpoint(State(state), Form(form(12.3, None, None)))
            .await
            .into_response();

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_fails_with_unknown_category() {
        let state = get_test_state();

        let response =
            create_transaction_endpoint(State(state.clone()), Form(form(12.3, Some(42), None)))
                .await
                .into_response();

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        let transactions = crate::transaction::get_all_transactions(&connection).unwrap();
        assert!(transactions.is_empty(), "store should be unchanged");
    }

    #[tokio::test]
    async fn donor_rejected_for_non_donation_category() {
        let state = get_test_state();
        create_category(
            CategoryName::new_unchecked("Kira"),
            CategoryKind::Expense,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = create_transaction_endpoint(
            State(state),
            Form(form(12.3, Some(1), Some("Ayşe Yılmaz"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn donor_accepted_for_donation_category() {
        let state = get_test_state();
        create_category(
            CategoryName::new_unchecked("bağış"),
            CategoryKind::Income,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = create_transaction_endpoint(
            State(state.clone()),
            Form(form(100.0, Some(1), Some("Ayşe Yılmaz"))),
        )
        .await
        .into_response();

        assert_redirects_to_dashboard(response);
        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, &connection).unwrap();
        assert_eq!(transaction.donor.as_deref(), Some("Ayşe Yılmaz"));
    }

    #[tokio::test]
    async fn empty_donor_is_stored_as_none() {
        let state = get_test_state();
        create_category(
            CategoryName::new_unchecked("Kira"),
            CategoryKind::Expense,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response =
            create_transaction_endpoint(State(state.clone()), Form(form(12.3, Some(1), Some(""))))
                .await
                .into_response();

        assert_redirects_to_dashboard(response);
        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, &connection).unwrap();
        assert_eq!(transaction.donor, None);
    }

    #[track_caller]
    fn assert_redirects_to_dashboard(response: Response<Body>) {
        let location = response
            .headers()
            .get(HX_REDIRECT)
            .expect("expected response to have the header hx-redirect");
        assert_eq!(
            location,
            endpoints::ROOT,
            "got redirect to {location:?}, want redirect to {}",
            endpoints::ROOT
        );
    }
}

//! Defines the endpoint for updating an existing transaction.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
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
    category::{CategoryId, get_category},
    database_id::TransactionID,
    transaction::{TransactionKind, core::update_transaction},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for editing a transaction.
///
/// The creation date and donor are fixed at creation and cannot be edited.
#[derive(Debug, Deserialize)]
pub struct EditTransactionForm {
    pub amount: f64,
    pub kind: TransactionKind,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub description: String,
}

/// A route handler for updating a transaction, redirects to the dashboard on success.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Path(transaction_id): Path<TransactionID>,
    Form(form): Form<EditTransactionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    // Like creation, an edit must point the transaction at a category that
    // exists right now, even though the reference may dangle later.
    let Some(category_id) = form.category_id else {
        return Error::InvalidCategory(None).into_alert_response();
    };

    if let Err(error) = get_category(category_id, &connection) {
        let error = match error {
            Error::NotFound => Error::InvalidCategory(Some(category_id)),
            error => error,
        };
        return error.into_alert_response();
    }

    if let Err(error) = update_transaction(
        transaction_id,
        form.amount,
        &form.description,
        category_id,
        form.kind,
        &connection,
    ) {
        tracing::error!("could not update transaction {transaction_id}: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::ROOT.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::{HeaderValue, StatusCode},
        response::IntoResponse,
    };
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;

    use crate::{
        category::{CategoryKind, CategoryName, create_category},
        db::initialize,
        endpoints,
        transaction::{
            TransactionBuilder, TransactionKind, create_transaction,
            edit_endpoint::{EditTransactionForm, EditTransactionState, edit_transaction_endpoint},
            get_transaction,
        },
    };

    fn get_test_state() -> EditTransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        EditTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn seed_transaction(state: &EditTransactionState) {
        let connection = state.db_connection.lock().unwrap();
        create_category(
            CategoryName::new_unchecked("Maaş"),
            CategoryKind::Income,
            &connection,
        )
        .unwrap();
        create_category(
            CategoryName::new_unchecked("Kira"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();
        create_transaction(
            TransactionBuilder {
                amount: 1000.0,
                kind: TransactionKind::Income,
                category_id: 1,
                description: "Eylül maaşı".to_owned(),
                donor: None,
            },
            &connection,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn can_update_transaction() {
        let state = get_test_state();
        seed_transaction(&state);
        let form = EditTransactionForm {
            amount: 300.0,
            kind: TransactionKind::Expense,
            category_id: Some(2),
            description: "Ekim kirası".to_owned(),
        };

        let response = edit_transaction_endpoint(State(state.clone()), Path(1), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(HX_REDIRECT),
            Some(&HeaderValue::from_static(endpoints::ROOT))
        );
        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, &connection).unwrap();
        assert_eq!(transaction.amount, 300.0);
        assert_eq!(transaction.kind, TransactionKind::Expense);
        assert_eq!(transaction.category_id, 2);
        assert_eq!(transaction.description, "Ekim kirası");
    }

    #[tokio::test]
    async fn update_preserves_creation_date() {
        let state = get_test_state();
        seed_transaction(&state);
        let created = {
            let connection = state.db_connection.lock().unwrap();
            get_transaction(1, &connection).unwrap().date
        };
        let form = EditTransactionForm {
            amount: 1200.0,
            kind: TransactionKind::Income,
            category_id: Some(1),
            description: "Zamlı maaş".to_owned(),
        };

        edit_transaction_endpoint(State(state.clone()), Path(1), Form(form))
            .await
            .into_response();

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_transaction(1, &connection).unwrap().date, created);
    }

    #[tokio::test]
    async fn update_fails_with_unknown_category() {
        let state = get_test_state();
        seed_transaction(&state);
        let form = EditTransactionForm {
            amount: 300.0,
            kind: TransactionKind::Expense,
            category_id: Some(42),
            description: "Ekim kirası".to_owned(),
        };

        let response = edit_transaction_endpoint(State(state.clone()), Path(1), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, &connection).unwrap();
        assert_eq!(transaction.amount, 1000.0, "store should be unchanged");
    }

    #[tokio::test]
    async fn update_missing_transaction_returns_not_found() {
        let state = get_test_state();
        seed_transaction(&state);
        let form = EditTransactionForm {
            amount: 300.0,
            kind: TransactionKind::Expense,
            category_id: Some(2),
            description: "Ekim kirası".to_owned(),
        };

        let response = edit_transaction_endpoint(State(state), Path(999), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

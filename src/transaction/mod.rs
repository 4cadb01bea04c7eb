//! Transaction management for the income and expense tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - View handlers for transaction-related web pages

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod receipt_page;

pub use core::{
    Transaction, TransactionBuilder, TransactionKind, create_transaction, create_transaction_table,
    delete_transaction, get_all_transactions, get_transaction, get_transactions_for_category,
    map_transaction_row, update_transaction,
};
pub use create_endpoint::{CreateTransactionState, create_transaction_endpoint};
pub use delete_endpoint::{DeleteTransactionState, delete_transaction_endpoint};
pub use edit_endpoint::{EditTransactionState, edit_transaction_endpoint};
pub use edit_page::{EditTransactionPageState, get_edit_transaction_page};
pub use form::{TransactionFormDefaults, transaction_form_fields};
pub use receipt_page::{ReceiptPageState, get_receipt_page};

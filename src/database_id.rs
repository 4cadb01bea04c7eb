//! Database ID type definition.

/// Alias for transaction row IDs.
pub type TransactionID = i64;

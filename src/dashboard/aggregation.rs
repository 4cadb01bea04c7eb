//! Pure aggregation over the filtered transaction list.
//!
//! All functions take the already-filtered transactions and compute their
//! results in memory, without rounding. Dangling category references count
//! towards the overall totals but are left out of the per-category breakdown.

use std::collections::HashSet;

use time::UtcOffset;

use crate::{
    category::{Category, CategoryId},
    transaction::{Transaction, TransactionKind},
};

/// The overall income, expense and net totals for a set of transactions.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// Sums all transactions, including those whose category no longer exists.
pub fn totals(transactions: &[Transaction]) -> Totals {
    let mut totals = Totals::default();

    for transaction in transactions {
        match transaction.kind {
            TransactionKind::Income => totals.income += transaction.amount,
            TransactionKind::Expense => totals.expense += transaction.amount,
        }
    }

    totals.net = totals.income - totals.expense;

    totals
}

/// Income and expense totals for a single category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBreakdownRow {
    pub category_id: CategoryId,
    pub name: String,
    pub income: f64,
    pub expense: f64,
}

/// Sums transactions per category, in the order the categories were created.
///
/// Every category gets a row, even with no matching transactions.
/// Transactions pointing at a deleted category are skipped here but still
/// count towards [totals].
pub fn per_category_breakdown(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<CategoryBreakdownRow> {
    let mut rows: Vec<CategoryBreakdownRow> = categories
        .iter()
        .map(|category| CategoryBreakdownRow {
            category_id: category.id,
            name: category.name.to_string(),
            income: 0.0,
            expense: 0.0,
        })
        .collect();

    for transaction in transactions {
        let Some(row) = rows
            .iter_mut()
            .find(|row| row.category_id == transaction.category_id)
        else {
            continue;
        };

        match transaction.kind {
            TransactionKind::Income => row.income += transaction.amount,
            TransactionKind::Expense => row.expense += transaction.amount,
        }
    }

    rows
}

/// The distinct years transactions fall in, newest first.
///
/// Used to populate the year filter so only years with data are offered.
pub fn observed_years(transactions: &[Transaction], local_offset: UtcOffset) -> Vec<i32> {
    let years: HashSet<i32> = transactions
        .iter()
        .map(|transaction| transaction.date.to_offset(local_offset).date().year())
        .collect();

    let mut years: Vec<i32> = years.into_iter().collect();
    years.sort_unstable_by(|a, b| b.cmp(a));

    years
}

/// Orders transactions newest first.
///
/// The sort is stable so transactions created at the same instant keep their
/// insertion order.
pub fn sort_by_date_descending(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
}

//! Table and card views for the dashboard.
//!
//! Renders the totals cards, the per-category breakdown table and the
//! filtered transaction list.

use maud::{Markup, html};
use time::{UtcOffset, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    category::Category,
    dashboard::aggregation::{CategoryBreakdownRow, Totals},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, EXPENSE_BADGE_STYLE, INCOME_BADGE_STYLE, LINK_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, currency_rounded_with_tooltip, format_currency,
    },
    transaction::{Transaction, TransactionKind},
};

const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[day]/[month]/[year]");

/// Gets the CSS class for coloring amounts (green for positive, red for negative).
fn amount_color_class(amount: f64) -> &'static str {
    if amount >= 0.0 {
        TABLE_CELL_GREEN_STYLE
    } else {
        TABLE_CELL_RED_STYLE
    }
}

/// Renders the income, expense and net totals as three cards.
pub(super) fn totals_cards(totals: &Totals) -> Markup {
    let card = |heading: &str, amount: f64, amount_class: &str| {
        html! {
            div class="bg-white dark:bg-gray-800 border border-gray-200 dark:border-gray-700 rounded-lg p-4 shadow-md"
            {
                h3 class="text-sm font-semibold text-gray-500 dark:text-gray-400 uppercase" { (heading) }
                p class={ "mt-2 text-2xl font-bold " (amount_class) } { (currency_rounded_with_tooltip(amount)) }
            }
        }
    };

    html! {
        section class="w-full grid grid-cols-1 sm:grid-cols-3 gap-4 mb-4"
        {
            (card("Income", totals.income, TABLE_CELL_GREEN_STYLE))
            (card("Expenses", totals.expense, TABLE_CELL_RED_STYLE))
            (card("Net", totals.net, amount_color_class(totals.net)))
        }
    }
}

/// Renders the per-category breakdown table.
///
/// Category names link to the category detail page.
pub(super) fn breakdown_table(breakdown: &[CategoryBreakdownRow]) -> Markup {
    if breakdown.is_empty() {
        return html! {};
    }

    html! {
        div class="w-full mb-4"
        {
            h3 class="text-xl font-semibold mb-4" { "By Category" }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Income" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Expenses" }
                        }
                    }
                    tbody
                    {
                        @for row in breakdown {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a
                                        href=(format_endpoint(endpoints::CATEGORY_VIEW, row.category_id))
                                        class=(LINK_STYLE)
                                    {
                                        (row.name)
                                    }
                                }
                                td class={(TABLE_CELL_STYLE) " text-right " (TABLE_CELL_GREEN_STYLE)}
                                {
                                    (currency_rounded_with_tooltip(row.income))
                                }
                                td class={(TABLE_CELL_STYLE) " text-right " (TABLE_CELL_RED_STYLE)}
                                {
                                    (currency_rounded_with_tooltip(row.expense))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Renders the filtered transactions as a table, newest first.
///
/// `categories` is used to resolve category names; a dangling reference shows
/// a placeholder. Donation rows get a link to the printable receipt.
pub(crate) fn transaction_table(
    transactions: &[Transaction],
    categories: &[Category],
    local_offset: UtcOffset,
) -> Markup {
    if transactions.is_empty() {
        return html! {
            p class="text-gray-600 dark:text-gray-400"
            {
                "No transactions match the current filter."
            }
        };
    }

    html! {
        div class="overflow-x-auto rounded-lg shadow w-full"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }
                tbody
                {
                    @for transaction in transactions {
                        (transaction_row(transaction, categories, local_offset))
                    }
                }
            }
        }
    }
}

fn transaction_row(
    transaction: &Transaction,
    categories: &[Category],
    local_offset: UtcOffset,
) -> Markup {
    let category = categories
        .iter()
        .find(|category| category.id == transaction.category_id);
    let is_donation = category.is_some_and(Category::is_donation);
    let date = transaction
        .date
        .to_offset(local_offset)
        .format(DATE_FORMAT)
        .unwrap_or_else(|_| transaction.date.to_string());
    let (badge_style, badge_text, amount_class) = match transaction.kind {
        TransactionKind::Income => (INCOME_BADGE_STYLE, "Income", TABLE_CELL_GREEN_STYLE),
        TransactionKind::Expense => (EXPENSE_BADGE_STYLE, "Expense", TABLE_CELL_RED_STYLE),
    };
    let confirm_message = format!(
        "Are you sure you want to delete the transaction '{}'? This cannot be undone.",
        transaction.description
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
        {
            td class=(TABLE_CELL_STYLE) { time { (date) } }
            td class={(TABLE_CELL_STYLE) " text-right whitespace-nowrap " (amount_class)}
            {
                (format_currency(transaction.amount))
            }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(badge_style) { (badge_text) }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @match category {
                    Some(category) => { (category.name) }
                    None => { span class="text-gray-400 dark:text-gray-500" { "—" } }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                (transaction.description)

                @if let Some(donor) = &transaction.donor {
                    span class="block text-xs text-gray-400 dark:text-gray-500" { (donor) }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a
                        href=(format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id))
                        class=(LINK_STYLE)
                    {
                        "Edit"
                    }

                    @if is_donation {
                        a
                            href=(format_endpoint(endpoints::RECEIPT_VIEW, transaction.id))
                            class=(LINK_STYLE)
                        {
                            "Receipt"
                        }
                    }

                    button
                        type="button"
                        hx-delete=(format_endpoint(endpoints::TRANSACTION, transaction.id))
                        hx-confirm=(confirm_message)
                        hx-target="closest tr"
                        hx-swap="delete"
                        hx-target-error="#alert-container"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        }
    }
}

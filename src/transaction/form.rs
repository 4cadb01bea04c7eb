use maud::{Markup, PreEscaped, html};

use crate::{
    category::{Category, CategoryId, CategoryKind},
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
    transaction::core::TransactionKind,
};

pub struct TransactionFormDefaults<'a> {
    pub kind: TransactionKind,
    pub amount: Option<f64>,
    pub description: Option<&'a str>,
    pub category_id: Option<CategoryId>,
    pub donor: Option<&'a str>,
    pub autofocus_amount: bool,
}

pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    available_categories: &[Category],
) -> Markup {
    let is_expense = matches!(defaults.kind, TransactionKind::Expense);
    let amount_str = defaults.amount.map(|amount| format!("{:.2}", amount.abs()));
    let amount_placeholder = amount_str.as_deref().unwrap_or("0.01");
    let description_placeholder = defaults.description.unwrap_or("Description");

    // Legacy categories without a kind are offered under both halves of the
    // selector.
    let income_categories = available_categories
        .iter()
        .filter(|category| category.kind.is_none_or(|kind| kind == CategoryKind::Income))
        .collect::<Vec<_>>();
    let expense_categories = available_categories
        .iter()
        .filter(|category| category.kind.is_none_or(|kind| kind == CategoryKind::Expense))
        .collect::<Vec<_>>();

    let donor_hidden = !available_categories
        .iter()
        .any(|category| Some(category.id) == defaults.category_id && category.is_donation());

    let category_option = |category: &Category| {
        html! {
            @if Some(category.id) == defaults.category_id {
                option value=(category.id) selected data-donation=(category.is_donation()) { (category.name) }
            } @else {
                option value=(category.id) data-donation=(category.is_donation()) { (category.name) }
            }
        }
    };

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Transaction type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-3"
                {
                    input
                        name="kind"
                        id="transaction-kind-expense"
                        type="radio"
                        value="expense"
                        checked[is_expense]
                        required
                        tabindex="0"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label
                        for="transaction-kind-expense"
                        class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Expense"
                    }
                }

                div class="flex items-center gap-3"
                {
                    input
                        name="kind"
                        id="transaction-kind-income"
                        type="radio"
                        value="income"
                        checked[!is_expense]
                        required
                        tabindex="0"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label
                        for="transaction-kind-income"
                        class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Income"
                    }
                }
            }
        }

        div
        {
            label
                for="amount"
                class=(FORM_LABEL_STYLE)
            {
                "Amount"
            }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    placeholder=(amount_placeholder)
                    min="0.01"
                    required
                    value=[amount_str.as_deref()]
                    autofocus[defaults.autofocus_amount]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label
                for="description"
                class=(FORM_LABEL_STYLE)
            {
                "Description"
            }

            input
                name="description"
                id="description"
                type="text"
                placeholder=(description_placeholder)
                value=[defaults.description]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        @if !available_categories.is_empty() {
            div
            {
                label
                    for="category_id"
                    class=(FORM_LABEL_STYLE)
                {
                    "Category"
                }

                select
                    name="category_id"
                    id="category_id"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select a category" }

                    optgroup label="Income"
                    {
                        @for category in &income_categories {
                            (category_option(category))
                        }
                    }

                    optgroup label="Expense"
                    {
                        @for category in &expense_categories {
                            (category_option(category))
                        }
                    }
                }
            }

            div id="donor-field" hidden[donor_hidden]
            {
                label
                    for="donor"
                    class=(FORM_LABEL_STYLE)
                {
                    "Donor"
                }

                input
                    name="donor"
                    id="donor"
                    type="text"
                    placeholder="Donor name"
                    value=[defaults.donor]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (donor_toggle_script())
        }
    }
}

// Shows the donor input only while the donation category is selected.
fn donor_toggle_script() -> Markup {
    html! {
        script {
            (PreEscaped(r#"
            (function () {
                const select = document.getElementById('category_id');
                const donorField = document.getElementById('donor-field');
                if (!select || !donorField) return;
                select.addEventListener('change', function () {
                    const option = select.selectedOptions[0];
                    const isDonation = option && option.dataset.donation === 'true';
                    donorField.hidden = !isDonation;
                    if (!isDonation) {
                        donorField.querySelector('input').value = '';
                    }
                });
            })();
            "#))
        }
    }
}

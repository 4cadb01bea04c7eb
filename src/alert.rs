//! Alert system for displaying error messages to users.
//!
//! Alerts are rendered as fragments that htmx swaps into the fixed
//! `#alert-container` element via the response-targets extension.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};

/// Renders alert messages with appropriate styling
pub struct AlertTemplate;

impl AlertTemplate {
    /// Create a new error alert
    pub fn error(message: &str, details: &str) -> Markup {
        alert(message, details)
    }
}

fn alert(message: &str, details: &str) -> Markup {
    let accent_style =
        "text-red-800 bg-red-50 dark:bg-gray-800 dark:text-red-400 border-red-300";

    html! {
        div
            role="alert"
            class={ "p-4 mb-4 rounded-lg border shadow " (accent_style) }
        {
            div class="flex items-start justify-between gap-4"
            {
                div
                {
                    p class="font-medium" { (message) }

                    @if !details.is_empty()
                    {
                        p class="mt-1 text-sm" { (details) }
                    }
                }

                button
                    type="button"
                    class="font-bold cursor-pointer"
                    aria-label="Close"
                    onclick="document.getElementById('alert-container').classList.add('hidden')"
                {
                    "✕"
                }
            }

            // The container starts out hidden, unhide it when an alert arrives.
            script
            {
                (PreEscaped("document.getElementById('alert-container').classList.remove('hidden');"))
            }
        }
    }
}

/// Render `markup` as an HTML response with the given `status_code`.
#[inline]
pub(crate) fn render(status_code: StatusCode, markup: Markup) -> Response {
    (status_code, markup).into_response()
}

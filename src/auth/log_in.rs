//! The log-in page and handler for the application password.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    app_state::create_cookie_key,
    auth::{
        DEFAULT_COOKIE_DURATION, get_sole_user, invalidate_auth_cookie, normalize_redirect_url,
        set_auth_cookie,
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, loading_spinner, log_in_register, password_input},
    timezone::get_local_offset,
};

/// Shown when the password does not match. Deliberately says nothing more.
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect password.";

const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

/// How long the session lasts when "remember me" is ticked at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

fn log_in_form(error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (password_input("", 0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "No password yet? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                    "Set one up here"
                }
            }
        }
    }
}

/// Validate a redirect URL taken from the query string or the form, logging
/// anything that gets thrown away.
fn accept_redirect_url(raw_url: Option<&str>) -> Option<String> {
    let raw_url = raw_url?;

    let normalized = normalize_redirect_url(raw_url);
    if normalized.is_none() {
        tracing::warn!("Ignoring invalid redirect URL: {raw_url}");
    }

    normalized
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = accept_redirect_url(query.redirect_url.as_deref());
    let form = log_in_form(None, redirect_url.as_deref());
    let content = log_in_register("Log in to Kumbara", &form);

    base("Log In", &[], &content).into_response()
}

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key for signing and encrypting the private auth cookie.
    pub cookie_key: Key,
    /// How long the auth cookie lasts without "remember me".
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Istanbul".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl LoginState {
    pub fn new(
        cookie_secret: &str,
        local_timezone: &str,
        db_connection: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection,
        }
    }
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// Lets `PrivateCookieJar` find the key in the log-in state.
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw log-in form data.
///
/// The password stays a plain string here, it is only ever compared against
/// the stored hash.
#[derive(Deserialize)]
pub struct LogInData {
    pub password: String,

    /// Comes from a checkbox: any string value means ticked, absent means
    /// not ticked.
    pub remember_me: Option<String>,

    /// Where to go after logging in. Only accepted as a same-site path.
    pub redirect_url: Option<String>,
}

/// Handle a log-in attempt.
///
/// A correct password sets the auth cookie and answers `HX-Redirect` to the
/// requested page (or the dashboard). Anything else re-renders the form with
/// an error message.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(form): Form<LogInData>,
) -> Response {
    let redirect_url = accept_redirect_url(form.redirect_url.as_deref());
    let retry =
        |message: &str| log_in_form(Some(message), redirect_url.as_deref()).into_response();

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => {
                tracing::error!("Could not acquire the database lock while logging in.");
                return retry(INTERNAL_ERROR_MSG);
            }
        };

        match get_sole_user(&connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                return retry(
                    "No password has been set yet. Create one on the registration page.",
                );
            }
            Err(error) => {
                tracing::error!("Could not load the registered user: {error}");
                return retry(INTERNAL_ERROR_MSG);
            }
        }
    };

    match user.password_hash.verify(&form.password) {
        Ok(true) => {}
        Ok(false) => return retry(INVALID_CREDENTIALS_ERROR_MSG),
        Err(error) => {
            tracing::error!("Could not verify the password: {error}");
            return retry(INTERNAL_ERROR_MSG);
        }
    }

    let duration = if form.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let destination = redirect_url.unwrap_or_else(|| endpoints::ROOT.to_owned());

    match set_auth_cookie(jar.clone(), user.id, duration, local_offset) {
        Ok(jar) => (StatusCode::SEE_OTHER, HxRedirect(destination), jar).into_response(),
        Err(error) => {
            tracing::error!("Could not set the auth cookie: {error}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
                .into_response()
        }
    }
}

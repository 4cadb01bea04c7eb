//! First-run registration: setting the password that protects the app.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
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
    Error, PasswordHash, ValidatedPassword,
    app_state::{AppState, create_cookie_key},
    auth::{DEFAULT_COOKIE_DURATION, insert_user, set_auth_cookie, user_exists},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
};

/// Client-side minimum password length. The zxcvbn check on the server is
/// the real gate.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn confirm_password_input(error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="confirm-password" class=(FORM_LABEL_STYLE) { "Confirm Password" }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(PASSWORD_INPUT_MIN_LENGTH)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn registration_form(
    password: &str,
    password_error: Option<&str>,
    confirm_error: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (password_input(password, PASSWORD_INPUT_MIN_LENGTH, password_error))
            (confirm_password_input(confirm_error))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Create Password"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already set a password? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                    "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form("", None, None);
    let content = log_in_register("Create Password", &form);

    base("Register", &[], &content).into_response()
}

/// The state needed to register the user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key for signing and encrypting the private auth cookie.
    pub cookie_key: Key,
    /// How long the auth cookie set after registration lasts.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Istanbul".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RegistrationState {
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

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// Lets `PrivateCookieJar` find the key in the registration state.
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub password: String,
    pub confirm_password: String,
}

/// Handle the registration form.
///
/// Registration only works while no password has been set: the app is single
/// user. On success the auth cookie is set and the client is sent to the
/// log-in page.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let already_registered = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => {
                tracing::error!("Could not acquire the database lock during registration.");
                return get_internal_server_error_redirect();
            }
        };

        user_exists(&connection).unwrap_or(false)
    };
    if already_registered {
        return registration_form(
            &form.password,
            None,
            Some("A password has already been set, please log in with it instead."),
        )
        .into_response();
    }

    let validated_password = match ValidatedPassword::new(&form.password) {
        Ok(password) => password,
        Err(error) => {
            return registration_form(&form.password, Some(&error.to_string()), None)
                .into_response();
        }
    };

    if form.password != form.confirm_password {
        return registration_form(&form.password, None, Some("Passwords do not match"))
            .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("Could not hash the password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => {
                tracing::error!("Could not acquire the database lock during registration.");
                return get_internal_server_error_redirect();
            }
        };

        match insert_user(password_hash, &connection) {
            Ok(user) => user,
            Err(error) => {
                tracing::error!("Could not store the new user: {error}");
                return get_internal_server_error_redirect();
            }
        }
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not set the auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        auth::{
            PasswordHash,
            user::{create_user_table, insert_user},
        },
        endpoints,
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{RegistrationState, get_register_page, register_user};

    const STRONG_PASSWORD: &str = "kırmızı kumbarada yedi lira";

    fn test_state() -> RegistrationState {
        let connection = Connection::open_in_memory().expect("Could not open database");
        create_user_table(&connection).expect("Could not create user table");

        RegistrationState::new("secret", "Etc/UTC", Arc::new(Mutex::new(connection)))
    }

    fn test_server(state: RegistrationState) -> TestServer {
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(state);

        TestServer::new(app)
    }

    #[track_caller]
    fn assert_error_contains(text: &str, needle: &str) {
        let document = scraper::Html::parse_fragment(text);
        let error_selector = Selector::parse("p.text-red-500").unwrap();
        let errors: String = document
            .select(&error_selector)
            .flat_map(|error| error.text())
            .collect();

        assert!(
            errors.to_lowercase().contains(needle),
            "expected an error containing {needle:?}, got {errors:?}"
        );
    }

    #[tokio::test]
    async fn page_renders_password_and_confirmation_inputs() {
        let response = get_register_page().await;

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form_selector =
            Selector::parse(&format!("form[hx-post='{}']", endpoints::USERS)).unwrap();
        let form = document
            .select(&form_selector)
            .next()
            .expect("expected the registration form");

        let password_selector = Selector::parse("input[type=password]").unwrap();
        assert_eq!(form.select(&password_selector).count(), 2);

        let log_in_link_selector =
            Selector::parse(&format!("a[href='{}']", endpoints::LOG_IN_VIEW)).unwrap();
        assert_eq!(form.select(&log_in_link_selector).count(), 1);
    }

    #[tokio::test]
    async fn registration_succeeds_and_redirects_to_log_in() {
        let server = test_server(test_state());

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("password", STRONG_PASSWORD),
                ("confirm_password", STRONG_PASSWORD),
            ])
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("hx-redirect"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn second_registration_is_rejected() {
        let state = test_state();
        insert_user(
            PasswordHash::from_raw_password(STRONG_PASSWORD, 4).unwrap(),
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not insert existing user");
        let server = test_server(state);

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("password", "başka güçlü bir parola olsun"),
                ("confirm_password", "başka güçlü bir parola olsun"),
            ])
            .await;

        response.assert_status_ok();
        assert_error_contains(&response.text(), "already been set");
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let server = test_server(test_state());

        let response = server
            .post(endpoints::USERS)
            .form(&[("password", "kumbara1"), ("confirm_password", "kumbara1")])
            .await;

        response.assert_status_ok();
        assert_error_contains(&response.text(), "too weak");
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_rejected() {
        let server = test_server(test_state());

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("password", STRONG_PASSWORD),
                ("confirm_password", "farklı bir parola yazdım"),
            ])
            .await;

        response.assert_status_ok();
        assert_error_contains(&response.text(), "do not match");
    }
}

//! Route guards that check the auth cookie and keep active sessions alive.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::{Duration, UtcOffset};

use crate::{
    AppState,
    auth::{
        build_log_in_redirect_url,
        cookie::{extend_auth_cookie_duration_if_needed, get_session_token},
        redirect::build_log_in_redirect_url_from_target,
    },
    endpoints,
    timezone::get_local_offset,
};

/// The state the guards need: the cookie key plus timezone info for the
/// re-issued cookie.
#[derive(Clone)]
pub struct AuthState {
    /// The key for decrypting and signing the private auth cookie.
    pub cookie_key: Key,
    /// The duration for which auth cookies are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Istanbul".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// Lets `PrivateCookieJar` find the key in the guard state.
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Where to send an unauthenticated client: the log-in page, carrying the
/// page they were trying to reach.
fn log_in_url(request: &Request) -> String {
    build_log_in_redirect_url(request).unwrap_or_else(|| {
        tracing::warn!("Could not build a redirect target. Falling back to the dashboard.");

        build_log_in_redirect_url_from_target(endpoints::ROOT)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    })
}

/// Append the jar's `Set-Cookie` headers to `response`.
fn with_cookies(response: Response, jar: PrivateCookieJar) -> Response {
    let (mut parts, body) = response.into_parts();

    for (name, value) in jar.into_response().headers() {
        if name == SET_COOKIE {
            parts.headers.append(name, value.to_owned());
        }
    }

    Response::from_parts(parts, body)
}

/// The shared guard body. `deny` decides how an unauthenticated client is
/// sent to the log-in page: a plain redirect for page loads, an `HX-Redirect`
/// for htmx calls.
///
/// On success the user ID is placed in the request extensions and the auth
/// cookie is re-issued so an active session does not run out mid-use
/// (sliding expiry).
async fn guard(
    state: AuthState,
    request: Request,
    next: Next,
    deny: impl Fn(&str) -> Response,
) -> Response {
    let log_in_url = log_in_url(&request);

    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => {
            tracing::error!(
                "Invalid local timezone {}. Redirecting to the log-in page.",
                state.local_timezone
            );
            return deny(&log_in_url);
        }
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Could not read cookies: {err:?}. Redirecting to the log-in page.");
            return deny(&log_in_url);
        }
    };

    let token = match get_session_token(&jar) {
        Ok(token) => token,
        Err(_) => return deny(&log_in_url),
    };

    parts.extensions.insert(token.user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar = refresh_session(jar, local_offset);

    with_cookies(response, jar)
}

fn refresh_session(jar: PrivateCookieJar, local_offset: UtcOffset) -> PrivateCookieJar {
    match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        super::DEFAULT_COOKIE_DURATION,
        local_offset,
    ) {
        Ok(extended) => extended,
        Err(err) => {
            tracing::error!("Could not extend the auth cookie: {err:?}. Leaving it as is.");
            jar
        }
    }
}

/// Guard for page routes. Unauthenticated clients get a 303 to the log-in
/// page.
///
/// Handlers behind the guard can read the user ID with
/// `Extension(user_id): Extension<UserID>`.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, |url| {
        Redirect::to(url).into_response()
    })
    .await
}

/// Guard for htmx API routes. Unauthenticated clients get an `HX-Redirect`
/// header instead of a plain redirect, since htmx ignores 3xx responses.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, |url| {
        (HxRedirect(url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Router,
        extract::State,
        middleware,
        response::Html,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use axum_test::TestServer;
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime, UtcOffset};

    use crate::{
        Error,
        auth::{
            UserID,
            cookie::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, set_auth_cookie},
        },
        endpoints,
    };

    use super::{AuthState, auth_guard, auth_guard_hx};

    const LOG_IN_ROUTE: &str = "/log_in_stub";
    const PAGE_ROUTE: &str = "/protected";
    const API_ROUTE: &str = "/api/protected";

    async fn protected_page() -> Html<&'static str> {
        Html("<p>kumbara</p>")
    }

    async fn log_in_stub(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        set_auth_cookie(jar, UserID::new(1), state.cookie_duration, UtcOffset::UTC)
    }

    fn test_server(cookie_duration: Duration) -> TestServer {
        let state = AuthState {
            cookie_key: Key::from(&Sha512::digest("kumbara-test")),
            cookie_duration,
            local_timezone: "Etc/UTC".to_owned(),
        };

        let page_routes = Router::new()
            .route(PAGE_ROUTE, get(protected_page))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));
        let api_routes = Router::new()
            .route(API_ROUTE, get(protected_page))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_guard_hx,
            ));

        let app = Router::new()
            .merge(page_routes)
            .merge(api_routes)
            .route(LOG_IN_ROUTE, post(log_in_stub))
            .with_state(state);

        TestServer::new(app)
    }

    fn expected_log_in_url(target: &str) -> String {
        let query = serde_urlencoded::to_string([("redirect_url", target)]).unwrap();
        format!("{}?{}", endpoints::LOG_IN_VIEW, query)
    }

    #[tokio::test]
    async fn valid_cookie_reaches_the_protected_page() {
        let server = test_server(DEFAULT_COOKIE_DURATION);
        let log_in = server.post(LOG_IN_ROUTE).await;
        log_in.assert_status_ok();

        server
            .get(PAGE_ROUTE)
            .add_cookie(log_in.cookie(COOKIE_TOKEN))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn missing_cookie_redirects_to_log_in_with_target() {
        let server = test_server(DEFAULT_COOKIE_DURATION);

        let response = server.get(PAGE_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), expected_log_in_url(PAGE_ROUTE));
    }

    #[tokio::test]
    async fn tampered_cookie_redirects_to_log_in() {
        let server = test_server(DEFAULT_COOKIE_DURATION);

        let response = server
            .get(PAGE_ROUTE)
            .add_cookie(Cookie::build((COOKIE_TOKEN, "garbage")).build())
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), expected_log_in_url(PAGE_ROUTE));
    }

    #[tokio::test]
    async fn guard_extends_a_short_lived_cookie() {
        let server = test_server(Duration::seconds(5));
        let log_in = server.post(LOG_IN_ROUTE).await;
        log_in.assert_status_ok();
        let issued_at = OffsetDateTime::now_utc();

        let response = server
            .get(PAGE_ROUTE)
            .add_cookies(log_in.cookies())
            .await;

        let cookie = response.cookie(COOKIE_TOKEN);
        let expiry = cookie.expires_datetime().unwrap();
        assert!(
            (expiry - (issued_at + DEFAULT_COOKIE_DURATION)).abs() < Duration::seconds(2),
            "got expiry {expiry}, want roughly {}",
            issued_at + DEFAULT_COOKIE_DURATION
        );
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn hx_guard_answers_with_hx_redirect() {
        let server = test_server(DEFAULT_COOKIE_DURATION);
        let current_url = "/?period=month&year=2025";

        let response = server
            .get(API_ROUTE)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", current_url)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("hx-redirect"),
            expected_log_in_url(current_url)
        );
    }
}

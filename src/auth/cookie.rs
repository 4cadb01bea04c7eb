//! Creating, reading, extending and invalidating the auth cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    auth::{UserID, token::SessionToken},
};

/// The name of the private cookie that stores the serialized [SessionToken].
pub const COOKIE_TOKEN: &str = "token";

/// How long an auth cookie should last by default.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Create an auth cookie for `user_id` that expires after `duration` and add
/// it to the cookie jar.
///
/// `local_offset` only affects how the expiry is displayed in the cookie
/// attributes, not the expiry instant itself.
///
/// # Errors
///
/// Returns an [Error::JSONSerializationError] if the token could not be
/// serialized. This should not happen in practice.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let token = SessionToken::issue(user_id, duration);

    let token_string = serde_json::to_string(&token)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    let cookie = Cookie::build((COOKIE_TOKEN, token_string))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .expires(token.expires_at.to_offset(local_offset))
        .build();

    Ok(jar.add(cookie))
}

/// Read and validate the session token from the cookie jar.
///
/// # Errors
///
/// Returns an [Error::CookieMissing] if the token cookie is absent, cannot be
/// parsed, or has expired.
pub fn get_session_token(jar: &PrivateCookieJar) -> Result<SessionToken, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;

    let token: SessionToken =
        serde_json::from_str(cookie.value()).map_err(|_| Error::CookieMissing)?;

    if token.is_expired() {
        return Err(Error::CookieMissing);
    }

    Ok(token)
}

/// Re-issue the auth cookie with `duration` if that would push its expiry
/// further into the future.
///
/// A cookie issued with a longer duration (e.g. "remember me") is left alone
/// so that routine requests do not shorten it.
///
/// # Errors
///
/// Returns an [Error::CookieMissing] if there is no valid token in the jar.
pub fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let token = get_session_token(&jar)?;

    let extended_expiry = OffsetDateTime::now_utc() + duration;

    if extended_expiry <= token.expires_at {
        return Ok(jar);
    }

    set_auth_cookie(jar, token.user_id, duration, local_offset)
}

/// Remove the auth cookie by overwriting it with an empty, already expired cookie.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let cookie = Cookie::build((COOKIE_TOKEN, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .max_age(Duration::ZERO)
        .build();

    jar.add(cookie)
}

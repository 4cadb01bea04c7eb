//! Safe handling of post-log-in redirect targets.
//!
//! A redirect target may arrive via the request URI (page navigation) or via
//! htmx headers (API calls). Either way only same-site paths are accepted, so
//! the log-in page can never be used as an open redirect.

use axum::{extract::Request, http::Uri};
use tracing::{error, warn};

use crate::endpoints;

/// Keep `path_and_query` only if it is a same-site path worth returning to.
fn sanitize_target(path_and_query: &str) -> Option<String> {
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return None;
    }

    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    // Redirecting back to the log-in page would loop.
    (path != endpoints::LOG_IN_VIEW).then(|| path_and_query.to_owned())
}

/// Validate a user-supplied redirect target.
///
/// Absolute URLs are rejected outright, they could point anywhere.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;

    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    sanitize_target(uri.path_and_query()?.as_str())
}

/// The log-in URL carrying the page to return to after logging in.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let target = if request.uri().path().starts_with("/api") {
        target_from_hx_headers(request)?
    } else {
        normalize_redirect_url(request.uri().path_and_query()?.as_str())?
    };

    build_log_in_redirect_url_from_target(&target)
}

pub(super) fn build_log_in_redirect_url_from_target(target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN_VIEW, param)),
        Err(err) => {
            error!("Could not encode redirect URL {target}: {err}");
            None
        }
    }
}

/// The page the user was on when an htmx request was denied.
///
/// `HX-Current-URL` holds the browser's full address, so the path is taken
/// from the parsed URL rather than rejecting it for being absolute.
fn target_from_hx_headers(request: &Request) -> Option<String> {
    let headers = request.headers();

    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));
    if !is_hx_request {
        warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        warn!("Missing HX-Current-URL header for /api request.");
        return None;
    };

    let target = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| sanitize_target(uri.path_and_query()?.as_str()));
    if target.is_none() {
        warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    target
}

#[cfg(test)]
mod redirect_tests {
    use axum::{body::Body, extract::Request};

    use crate::endpoints;

    use super::{build_log_in_redirect_url, normalize_redirect_url};

    #[test]
    fn accepts_relative_paths_with_queries() {
        assert_eq!(
            normalize_redirect_url("/?period=month&year=2025"),
            Some("/?period=month&year=2025".to_owned())
        );
    }

    #[test]
    fn rejects_absolute_and_protocol_relative_urls() {
        assert_eq!(normalize_redirect_url("https://example.com/"), None);
        assert_eq!(normalize_redirect_url("//example.com/"), None);
    }

    #[test]
    fn rejects_the_log_in_page_itself() {
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
    }

    #[test]
    fn hx_current_url_keeps_path_of_absolute_url() {
        let request = Request::builder()
            .uri("/api/transactions")
            .header("HX-Request", "true")
            .header("HX-Current-URL", "https://localhost:3000/?period=week")
            .body(Body::empty())
            .unwrap();

        let url = build_log_in_redirect_url(&request).unwrap();

        assert_eq!(
            url,
            format!("{}?redirect_url=%2F%3Fperiod%3Dweek", endpoints::LOG_IN_VIEW)
        );
    }

    #[test]
    fn api_request_without_hx_headers_yields_no_target() {
        let request = Request::builder()
            .uri("/api/transactions")
            .body(Body::empty())
            .unwrap();

        assert_eq!(build_log_in_redirect_url(&request), None);
    }
}

//! Cookie transport for the token pair.
//!
//! Both tokens travel as host-only `HttpOnly` cookies: no `Domain`
//! attribute, so they never leak to sibling hosts. Values are assembled
//! by hand; the attribute set is small enough that a cookie crate would
//! only add surface.

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};

use keygate_auth::IssuedTokens;
use keygate_core::config::AppConfig;
use keygate_core::config::cookies::CookieConfig;
use keygate_core::error::{AppError, ErrorKind};
use keygate_core::result::AppResult;

/// Cookie carrying the signed access token.
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie carrying the opaque refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

fn same_site_attr(config: &CookieConfig) -> &'static str {
    match config.same_site.to_ascii_lowercase().as_str() {
        "lax" => "Lax",
        "none" => "None",
        _ => "Strict",
    }
}

fn build_cookie(
    name: &str,
    value: &str,
    max_age_seconds: i64,
    config: &CookieConfig,
) -> AppResult<HeaderValue> {
    let mut cookie = format!(
        "{name}={value}; Path=/; HttpOnly; SameSite={}; Max-Age={max_age_seconds}",
        same_site_attr(config)
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to encode cookie header", e))
}

/// Builds the `Set-Cookie` headers installing a fresh token pair.
///
/// Max-ages mirror the configured TTLs so the browser drops each cookie
/// when its token dies.
pub fn session_cookies(tokens: &IssuedTokens, config: &AppConfig) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        build_cookie(
            ACCESS_COOKIE,
            &tokens.access_token,
            config.auth.access_ttl_seconds as i64,
            &config.cookies,
        )?,
    );
    headers.append(
        SET_COOKIE,
        build_cookie(
            REFRESH_COOKIE,
            &tokens.refresh_token,
            config.auth.refresh_ttl_seconds as i64,
            &config.cookies,
        )?,
    );
    Ok(headers)
}

/// Builds the `Set-Cookie` headers removing both token cookies.
pub fn clear_cookies(config: &AppConfig) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        build_cookie(ACCESS_COOKIE, "", 0, &config.cookies)?,
    );
    headers.append(
        SET_COOKIE,
        build_cookie(REFRESH_COOKIE, "", 0, &config.cookies)?,
    );
    Ok(headers)
}

/// Extracts a named cookie value from a request's `Cookie` header.
///
/// Pairs without `=` are skipped rather than failing the whole header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let Some((key, val)) = pair.trim().split_once('=') else {
            continue;
        };
        let val = val.trim();
        if key.trim() == name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

/// Extracts a bearer token from a request's `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let token = value.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

//! The API endpoints URIs.
//!
//! The horoscope and transaction routes are served both from the root and
//! nested under [API_PREFIX].

/// The root route which serves the liveness message.
pub const ROOT: &str = "/";
/// The prefix under which the API routes are mounted a second time.
pub const API_PREFIX: &str = "/api";
/// The route for looking up the horoscope of a zodiac sign.
pub const HOROSCOPE: &str = "/horoscope";
/// The route for submitting a payment transaction with a screenshot.
pub const SUBMIT_TRANSACTION: &str = "/submit-transaction";

/// Prefix `endpoint` with [API_PREFIX].
#[cfg(test)]
pub fn api_endpoint(endpoint: &str) -> String {
    format!("{API_PREFIX}{endpoint}")
}

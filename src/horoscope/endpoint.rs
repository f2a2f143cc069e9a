//! The horoscope lookup endpoint.

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};

use crate::{Error, horoscope::ZodiacSign};

/// The body of a successful horoscope lookup.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HoroscopeReply {
    /// Today's horoscope for the requested sign.
    pub description: String,
}

/// The sign field of a JSON or url-encoded request body.
///
/// The sign is `None` when the field is missing, empty or not a string, and
/// when the body cannot be parsed at all.
#[derive(Debug, Default, PartialEq)]
pub struct SignRequest {
    /// The sign exactly as the client sent it.
    pub sign: Option<String>,
}

impl<S> FromRequest<S> for SignRequest
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body_kind = BodyKind::from_headers(request.headers());

        let bytes = match Bytes::from_request(request, state).await {
            Ok(bytes) => bytes,
            Err(rejection) => {
                tracing::debug!("could not read horoscope request body: {rejection}");
                return Ok(Self::default());
            }
        };

        let sign = match body_kind {
            BodyKind::Json => parse_json_sign(&bytes),
            BodyKind::Form => parse_form_sign(&bytes),
            BodyKind::Other => None,
        };

        Ok(Self {
            sign: sign.filter(|sign| !sign.is_empty()),
        })
    }
}

enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    fn from_headers(headers: &HeaderMap) -> Self {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime == "application/json" || mime.ends_with("+json") {
            BodyKind::Json
        } else if mime == "application/x-www-form-urlencoded" {
            BodyKind::Form
        } else {
            BodyKind::Other
        }
    }
}

fn parse_json_sign(bytes: &[u8]) -> Option<String> {
    let body: serde_json::Value = serde_json::from_slice(bytes)
        .inspect_err(|error| tracing::debug!("could not parse JSON body: {error}"))
        .ok()?;

    body.get("sign")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

fn parse_form_sign(bytes: &[u8]) -> Option<String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes)
        .inspect_err(|error| tracing::debug!("could not parse url-encoded body: {error}"))
        .ok()?
        .into_iter()
        .find_map(|(key, value)| (key == "sign").then_some(value))
}

/// Look up today's horoscope for the sign in the request body.
///
/// # Errors
/// Returns [Error::MissingSign] if there is no sign in the body, and
/// [Error::UnknownSign] if the sign is not one of the twelve zodiac signs.
pub async fn horoscope_endpoint(
    SignRequest { sign }: SignRequest,
) -> Result<Json<HoroscopeReply>, Error> {
    let sign: ZodiacSign = sign.ok_or(Error::MissingSign)?.parse()?;
    tracing::debug!("serving horoscope for {sign}");

    Ok(Json(HoroscopeReply {
        description: sign.description().to_owned(),
    }))
}

//! Request encoders: turn a URL plus parameters into a [`Request`].
//!
//! Encoders are pure and never touch the network. A URL that fails to parse
//! is reported here and never reaches the retry executor.

use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Method, Url,
};

use crate::{ClientError, JsonParams, Params, Request, Result};

const APPLICATION_JSON: &str = "application/json";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Parses `url`, mapping failures to [`ClientError::InvalidUrl`].
///
/// Only `http` and `https` URLs are accepted.
pub fn parse_url(url: &str) -> Result<Url> {
    let invalid = |source: Box<dyn std::error::Error + Send + Sync>| ClientError::InvalidUrl {
        url: url.to_owned(),
        source,
    };
    let parsed = Url::parse(url).map_err(|err| invalid(err.into()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(format!("unsupported scheme '{other}'").into())),
    }
}

/// Builds a request whose body is `params` serialized as a JSON object.
///
/// Empty `params` produce a request without a body.
pub fn json_request(
    method: Method,
    url: &str,
    params: &JsonParams,
    headers: &HeaderMap,
) -> Result<Request> {
    let url = parse_url(url)?;
    let body = if params.is_empty() {
        None
    } else {
        let encoded =
            serde_json::to_vec(params).map_err(|err| ClientError::Encode(err.to_string()))?;
        Some(encoded.into())
    };

    Ok(Request {
        method,
        url,
        headers: merged_headers(APPLICATION_JSON, headers),
        body,
    })
}

/// Builds a request whose body is `params` in `application/x-www-form-urlencoded` form.
pub fn form_request(
    method: Method,
    url: &str,
    params: &Params,
    headers: &HeaderMap,
) -> Result<Request> {
    let url = parse_url(url)?;
    let encoded = serde_urlencoded::to_string(params.as_pairs())
        .map_err(|err| ClientError::Encode(err.to_string()))?;

    Ok(Request {
        method,
        url,
        headers: merged_headers(FORM_URLENCODED, headers),
        body: Some(encoded.into()),
    })
}

/// Builds a `GET` request with `params` appended to the URL's query string.
///
/// Query pairs already present in `url` are kept ahead of `params`. Empty
/// `params` leave the URL untouched.
pub fn query_request(url: &str, params: &Params, headers: &HeaderMap) -> Result<Request> {
    let mut url = parse_url(url)?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.iter());
    }

    Ok(Request {
        method: Method::GET,
        url,
        headers: headers.clone(),
        body: None,
    })
}

/// Starts from the encoder's content type and lays the caller's headers on
/// top. Every key the caller supplies replaces the encoder's values for it.
fn merged_headers(content_type: &'static str, supplied: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(supplied.len() + 1);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    for name in supplied.keys() {
        headers.remove(name);
        for value in supplied.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

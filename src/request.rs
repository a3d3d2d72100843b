use bytes::Bytes;
use reqwest::{header::HeaderMap, Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{ClientError, Result};

/// A fully formed request handed to the retry executor.
///
/// The executor only borrows it, so every attempt sends the same method,
/// URL, headers and body.
#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// Request body. `None` sends no body at all.
    pub body: Option<Bytes>,
}

impl Request {
    /// Creates a request without headers or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A response received from the transport.
///
/// The body is fully buffered; dropping the response releases it.
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Decodes the body as UTF-8 text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|err| ClientError::Decode(format!("response body is not utf-8: {err}")))
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|err| {
            ClientError::Decode(format!(
                "invalid response JSON: {err}; body: {}",
                String::from_utf8_lossy(&self.body)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{header::HeaderMap, StatusCode};
    use serde_json::{json, Value as JsonValue};

    use super::Response;
    use crate::ClientError;

    #[test]
    fn json_body_decodes() {
        let response = Response::new(StatusCode::OK, HeaderMap::new(), r#"{"ok": 1}"#);
        let value: JsonValue = response.json().expect("body must be json");
        assert_eq!(value, json!({"ok": 1}));
    }

    #[test]
    fn invalid_json_body_is_decode_error() {
        let response = Response::new(StatusCode::OK, HeaderMap::new(), "not json");
        let err = response
            .json::<JsonValue>()
            .expect_err("plain text must not decode");
        assert!(matches!(err, ClientError::Decode(message) if message.contains("not json")));
    }

    #[test]
    fn non_utf8_text_is_decode_error() {
        let response = Response::new(StatusCode::OK, HeaderMap::new(), vec![0xff, 0xfe]);
        assert!(matches!(response.text(), Err(ClientError::Decode(_))));
    }
}

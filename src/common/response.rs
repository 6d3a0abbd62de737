// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Infrastructure types related to packaging rate-limit information alongside responses from
//! Twitter.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use hyper::body::Bytes;
use hyper::ext::ReasonPhrase;
use hyper::header::{HeaderMap, HeaderValue};
use hyper::{Body, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result, TwitterErrorCode};

// n.b. this type alias is re-exported at the crate root - these docs are public!
/// A set of headers returned with a response.
pub type Headers = HeaderMap<HeaderValue>;

const X_RATE_LIMIT_LIMIT: &str = "x-rate-limit-limit";
const X_RATE_LIMIT_REMAINING: &str = "x-rate-limit-remaining";
const X_RATE_LIMIT_RESET: &str = "x-rate-limit-reset";

/// Rate limit information returned with a response.
///
/// Each field is taken from its own header. A header that is missing or that doesn't hold an
/// integer leaves its field as `None`; it is never filled in with a zero, so "no information" can't
/// be mistaken for "no requests left".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// The rate limit ceiling for the given request.
    pub limit: Option<i32>,
    /// The number of requests left for the 15-minute window.
    pub remaining: Option<i32>,
    /// The UTC Unix timestamp at which the rate window resets.
    pub reset: Option<i64>,
}

impl RateLimit {
    /// Reads the `x-rate-limit-*` headers out of the given header map.
    pub fn from_headers(headers: &Headers) -> RateLimit {
        RateLimit {
            limit: rate_header(headers, X_RATE_LIMIT_LIMIT),
            remaining: rate_header(headers, X_RATE_LIMIT_REMAINING),
            reset: rate_header(headers, X_RATE_LIMIT_RESET),
        }
    }

    /// Returns the moment the rate window resets, if Twitter sent one.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }

    /// Returns the number of seconds until the rate window resets, counted from now. A reset time
    /// in the past counts as zero.
    pub fn seconds_until_reset(&self) -> Option<i64> {
        self.seconds_until_reset_from(Utc::now())
    }

    fn seconds_until_reset_from(&self, now: DateTime<Utc>) -> Option<i64> {
        self.reset.map(|ts| (ts - now.timestamp()).max(0))
    }

    /// Returns whether Twitter reported that no requests are left in this window.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Returns how long a caller should wait before calling this endpoint again.
    ///
    /// `None` means there is no reason to wait: either requests remain, or Twitter didn't say how
    /// many remain. An exhausted window with no reset time yields a zero wait.
    pub fn must_wait(&self) -> Option<Duration> {
        self.must_wait_from(Utc::now())
    }

    fn must_wait_from(&self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.is_exhausted() {
            return None;
        }

        let secs = self.seconds_until_reset_from(now).unwrap_or(0);
        Some(Duration::from_secs(secs as u64))
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn field<T: fmt::Display>(val: &Option<T>) -> String {
            match val {
                Some(v) => v.to_string(),
                None => "-".to_string(),
            }
        }

        write!(
            f,
            "{}/{} remaining, resets at {}",
            field(&self.remaining),
            field(&self.limit),
            field(&self.reset)
        )
    }
}

fn rate_header<T: std::str::FromStr>(headers: &Headers, name: &str) -> Option<T> {
    let value = headers.get(name)?;
    let parsed = value.to_str().ok().and_then(|s| s.trim().parse().ok());
    if parsed.is_none() {
        log::warn!("ignoring unparseable {} header: {:?}", name, value);
    }
    parsed
}

/// A response from Twitter, with its decoded body and accompanying rate limit information.
///
/// An empty body leaves everything but the status and headers unset: `json`, `raw_body` and
/// `rate_limit` all return `None`. A non-empty body must be a JSON object or array; anything else
/// fails construction.
///
/// Fields of an object body can be read by name with [`get`], which returns `None` for names the
/// body doesn't have. To work with a typed structure instead, hand the response to [`decode`].
///
/// [`get`]: #method.get
/// [`decode`]: #method.decode
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    reason: Option<String>,
    headers: Headers,
    raw: Option<String>,
    json: Option<Value>,
    rate_limit: Option<RateLimit>,
}

impl Response {
    /// Assembles a `Response` from the pieces of an HTTP response.
    pub fn from_parts(status: StatusCode, headers: Headers, body: &[u8]) -> Result<Response> {
        let mut resp = Response {
            status,
            reason: status.canonical_reason().map(|r| r.to_string()),
            headers,
            raw: None,
            json: None,
            rate_limit: None,
        };

        if body.is_empty() {
            return Ok(resp);
        }

        resp.raw = Some(String::from_utf8_lossy(body).into_owned());
        resp.rate_limit = Some(RateLimit::from_headers(&resp.headers));

        let json: Value = serde_json::from_slice(body).map_err(Error::InvalidJson)?;
        if !(json.is_object() || json.is_array()) {
            return Err(Error::Domain(format!(
                "expected a JSON object or array, received {}",
                json
            )));
        }
        resp.json = Some(json);

        Ok(resp)
    }

    /// Reads the body out of the given `hyper` response and wraps it.
    pub async fn from_hyper(resp: hyper::Response<Body>) -> Result<Response> {
        RawReply::from_hyper(resp).await?.into_response()
    }

    /// The HTTP status of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason phrase sent with this response's status, or the standard one for the status
    /// code if the server didn't send its own.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The body of this response as text, if there was one.
    pub fn raw_body(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// The decoded JSON body, if there was one.
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Rate-limit information from the response headers. Unset when the response had no body.
    pub fn rate_limit(&self) -> Option<&RateLimit> {
        self.rate_limit.as_ref()
    }

    /// Returns whether the HTTP status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns whether the HTTP status is a client or server error.
    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }

    /// Returns the errors Twitter reported with this response.
    ///
    /// A successful response has no errors. A failed one is expected to carry an `errors` array;
    /// if it doesn't, this returns a `Domain` error since there's no telling what happened.
    pub fn errors(&self) -> Result<Vec<TwitterErrorCode>> {
        if self.is_success() {
            return Ok(Vec::new());
        }

        match self.get("errors") {
            Some(errors) => {
                Vec::<TwitterErrorCode>::deserialize(errors).map_err(Error::InvalidJson)
            }
            None => Err(Error::Domain(format!(
                "error response ({}) without an `errors` property",
                self.status
            ))),
        }
    }

    /// Returns the named field of the decoded JSON object, or `None` if it has no such field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.json.as_ref().and_then(|json| json.get(name))
    }

    /// Deserializes the JSON body into the given type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.json {
            Some(json) => T::deserialize(json).map_err(Error::InvalidJson),
            None => Err(Error::Domain("response has no body to decode".to_string())),
        }
    }
}

/// A response whose body hasn't been decoded yet.
///
/// Calls that have to look at the status before trusting the body (the media upload steps) get
/// one of these, and only turn it into a `Response` once they know the body should be JSON.
#[derive(Debug, Clone)]
pub(crate) struct RawReply {
    pub status: StatusCode,
    pub reason: Option<String>,
    pub headers: Headers,
    pub body: Bytes,
}

impl RawReply {
    /// Reads the body out of the given `hyper` response, keeping the reason phrase the server
    /// sent.
    pub async fn from_hyper(resp: hyper::Response<Body>) -> Result<RawReply> {
        let (parts, body) = resp.into_parts();
        let reason = parts
            .extensions
            .get::<ReasonPhrase>()
            .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
            .or_else(|| parts.status.canonical_reason().map(|r| r.to_string()));
        let body = hyper::body::to_bytes(body).await?;

        Ok(RawReply {
            status: parts.status,
            reason,
            headers: parts.headers,
            body,
        })
    }

    /// The body as text, however it was encoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body, as `Response::from_parts` does.
    pub fn into_response(self) -> Result<Response> {
        let mut resp = Response::from_parts(self.status, self.headers, &self.body)?;
        resp.reason = self.reason;
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::tests::load_file;

    fn headers(pairs: &[(&'static str, &'static str)]) -> Headers {
        let mut map = Headers::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn named_fields_round_trip() {
        let body = load_file("sample_payloads/tweet.json");
        let resp = Response::from_parts(StatusCode::OK, Headers::new(), body.as_bytes()).unwrap();
        let expected: Value = serde_json::from_str(&body).unwrap();

        assert_eq!(resp.get("id_str"), expected.get("id_str"));
        assert_eq!(resp.get("text").and_then(|v| v.as_str()), Some("just setting up my twttr"));
        assert_eq!(resp.get("user").and_then(|u| u.get("screen_name")), expected["user"].get("screen_name"));
        assert_eq!(resp.get("no_such_field"), None);
        assert_eq!(resp.raw_body(), Some(body.as_str()));
    }

    #[test]
    fn empty_body_populates_nothing() {
        let resp = Response::from_parts(
            StatusCode::NO_CONTENT,
            headers(&[("x-rate-limit-limit", "15")]),
            b"",
        )
        .unwrap();

        assert!(resp.is_success());
        assert!(resp.json().is_none());
        assert!(resp.raw_body().is_none());
        assert!(resp.rate_limit().is_none());
        assert!(resp.get("anything").is_none());
    }

    #[test]
    fn bad_json_is_domain_error() {
        let err = Response::from_parts(StatusCode::OK, Headers::new(), b"<html>").unwrap_err();
        assert!(err.is_domain());

        let err = Response::from_parts(StatusCode::OK, Headers::new(), b"42").unwrap_err();
        assert!(err.is_domain());
    }

    #[test]
    fn array_body() {
        let resp = Response::from_parts(StatusCode::OK, Headers::new(), b"[1,2,3]").unwrap();
        assert!(resp.get("0").is_none());
        let ids: Vec<u64> = resp.decode().unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn errors_property() {
        let body = load_file("sample_payloads/errors.json");
        let resp = Response::from_parts(StatusCode::FORBIDDEN, Headers::new(), body.as_bytes()).unwrap();

        assert!(resp.is_error());
        assert!(!resp.is_success());
        let errors = resp.errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, 187);
        assert_eq!(errors[0].message, "Status is a duplicate.");

        let ok = Response::from_parts(StatusCode::OK, Headers::new(), b"{}").unwrap();
        assert!(ok.errors().unwrap().is_empty());

        let shapeless = Response::from_parts(StatusCode::BAD_REQUEST, Headers::new(), b"{}").unwrap();
        assert!(shapeless.errors().unwrap_err().is_domain());
    }

    #[test]
    fn rate_limit_headers() {
        let resp = Response::from_parts(
            StatusCode::OK,
            headers(&[
                ("x-rate-limit-limit", "900"),
                ("x-rate-limit-remaining", "899"),
                ("x-rate-limit-reset", "1700000000"),
            ]),
            b"{}",
        )
        .unwrap();

        let rate = resp.rate_limit().unwrap();
        assert_eq!(rate.limit, Some(900));
        assert_eq!(rate.remaining, Some(899));
        assert_eq!(rate.reset, Some(1700000000));
        assert_eq!(rate.reset_at().unwrap().timestamp(), 1700000000);
    }

    #[test]
    fn missing_rate_limit_headers_stay_unset() {
        let rate = RateLimit::from_headers(&headers(&[
            ("x-rate-limit-limit", "180"),
            ("x-rate-limit-remaining", "many"),
        ]));

        assert_eq!(rate.limit, Some(180));
        assert_eq!(rate.remaining, None);
        assert_eq!(rate.reset, None);
    }

    #[tokio::test]
    async fn reason_phrase_from_server() {
        let mut sent = hyper::Response::new(Body::from("Slow down"));
        *sent.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
        sent.extensions_mut()
            .insert(ReasonPhrase::from_static(b"Over Capacity"));

        let raw = RawReply::from_hyper(sent).await.unwrap();
        assert_eq!(raw.reason.as_deref(), Some("Over Capacity"));
        assert_eq!(raw.text(), "Slow down");

        let mut sent = hyper::Response::new(Body::from("{}"));
        *sent.status_mut() = StatusCode::TOO_MANY_REQUESTS;
        sent.extensions_mut()
            .insert(ReasonPhrase::from_static(b"Enhance Your Calm"));
        let resp = Response::from_hyper(sent).await.unwrap();
        assert_eq!(resp.reason(), Some("Enhance Your Calm"));

        let mut sent = hyper::Response::new(Body::from("{}"));
        *sent.status_mut() = StatusCode::PAYLOAD_TOO_LARGE;
        let resp = Response::from_hyper(sent).await.unwrap();
        assert_eq!(resp.reason(), Some("Payload Too Large"));
    }

    #[test]
    fn rate_limit_display() {
        let full = RateLimit {
            limit: Some(15),
            remaining: Some(3),
            reset: Some(1700000000),
        };
        assert_eq!(full.to_string(), "3/15 remaining, resets at 1700000000");

        let partial = RateLimit {
            limit: Some(15),
            remaining: None,
            reset: None,
        };
        assert_eq!(partial.to_string(), "-/15 remaining, resets at -");
    }

    #[test]
    fn rate_limit_backoff() {
        let now = Utc.timestamp_opt(1700000000, 0).single().unwrap();

        let exhausted = RateLimit {
            limit: Some(15),
            remaining: Some(0),
            reset: Some(1700000090),
        };
        assert!(exhausted.is_exhausted());
        assert_eq!(exhausted.must_wait_from(now), Some(Duration::from_secs(90)));

        let stale = RateLimit {
            reset: Some(1699999000),
            ..exhausted
        };
        assert_eq!(stale.must_wait_from(now), Some(Duration::from_secs(0)));

        let no_reset = RateLimit {
            reset: None,
            ..exhausted
        };
        assert_eq!(no_reset.must_wait_from(now), Some(Duration::from_secs(0)));

        let unknown = RateLimit::default();
        assert!(!unknown.is_exhausted());
        assert_eq!(unknown.must_wait_from(now), None);
        assert_eq!(unknown.seconds_until_reset_from(now), None);

        let plenty = RateLimit {
            remaining: Some(10),
            ..exhausted
        };
        assert_eq!(plenty.must_wait_from(now), None);
    }
}

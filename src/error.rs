// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A composite error type for errors that can occur while interacting with Twitter.
//!
//! Any action that crosses the network to call Twitter has many places where it can go wrong.
//! Whether it's a bad network connection, a revoked authorization token, a deleted tweet, or
//! anything in between, those errors are all represented in the (rather sprawling) [`Error`] enum.
//! Errors that come from the caller's own input are kept apart from errors that come from
//! Twitter: `InvalidArgument` and `InvalidMedia` are raised before anything is sent.
//!
//! [`Error`]: enum.Error.html

use std::fmt;

use hyper::StatusCode;
use serde::{Deserialize, Serialize};

/// Convenient alias to a Result containing a local Error type
pub type Result<T> = std::result::Result<T, Error>;

/// A set of errors that can be returned in the `errors` field of an error response.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterErrors {
    /// A collection of errors returned by Twitter.
    pub errors: Vec<TwitterErrorCode>,
}

impl fmt::Display for TwitterErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for e in &self.errors {
            if first {
                first = false;
            } else {
                writeln!(f, ",")?;
            }

            write!(f, "{}", e)?;
        }

        Ok(())
    }
}

/// Represents a specific error returned from a Twitter API call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TwitterErrorCode {
    /// The error message returned by Twitter.
    pub message: String,
    /// The numeric error code returned by Twitter. A list of possible error codes can be found in
    /// the [API documentation][error-codes].
    ///
    /// [error-codes]: https://developer.twitter.com/en/docs/basics/response-codes
    pub code: i32,
}

impl fmt::Display for TwitterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}: {}", self.code, self.message)
    }
}

/// A set of errors that can occur when interacting with Twitter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller handed over a parameter that Twitter would reject: a malformed screen name or
    /// geocode, empty or over-long text, a mixed or over-sized identifier batch. The enclosed
    /// value describes the offending input. Nothing was sent to Twitter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The response from Twitter did not have the shape this library expected, or the request was
    /// made in a session state that can't authorize it (for example a user-context call with a
    /// bearer token).
    #[error("Unexpected API state: {0}")]
    Domain(String),
    /// The response body could not be decoded as a JSON object or array. The enclosed value is
    /// the underlying parse error.
    #[error("Unparseable response body: {0}")]
    InvalidJson(#[source] serde_json::Error),
    /// The media given to an upload is unusable: the file can't be read or the declared media
    /// type isn't shaped like `type/subtype`.
    #[error("Invalid media: {0}")]
    InvalidMedia(String),
    /// A step of the chunked media upload failed. `segment_index` is present when the failure
    /// happened while sending the given APPEND segment.
    #[error("{}", describe_upload_failure(.message, .status, .reason, .segment_index))]
    MediaUpload {
        /// What went wrong.
        message: String,
        /// HTTP status of the failing response, if one was received.
        status: Option<StatusCode>,
        /// Reason phrase accompanying `status`.
        reason: Option<String>,
        /// The APPEND segment that failed, if the failure happened during APPEND.
        segment_index: Option<u64>,
    },
    /// The request did not complete within the transport's configured timeout.
    #[error("Request timed out")]
    Timeout,
    /// A URL could not be assembled from the given base and path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The request could not be assembled. The enclosed value is the error `http` raised.
    #[error("Request construction error: {0}")]
    HttpError(#[from] hyper::http::Error),
    /// The network connection failed. The enclosed value is the error raised by `hyper`.
    #[error("Network error: {0}")]
    NetError(#[from] hyper::Error),
    /// An I/O error occurred while reading a file or the network stream.
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

impl Error {
    /// Returns whether this error reports an unexpected response shape or session state, rather
    /// than a problem with the caller's input or the network.
    pub fn is_domain(&self) -> bool {
        matches!(self, Error::Domain(_) | Error::InvalidJson(_))
    }

    pub(crate) fn media_upload(message: impl Into<String>) -> Error {
        Error::MediaUpload {
            message: message.into(),
            status: None,
            reason: None,
            segment_index: None,
        }
    }
}

fn describe_upload_failure(
    message: &str,
    status: &Option<StatusCode>,
    reason: &Option<String>,
    segment_index: &Option<u64>,
) -> String {
    let mut out = format!("Media upload failed: {}", message);
    if let Some(status) = status {
        out.push_str(&format!(" ({}", status.as_u16()));
        if let Some(reason) = reason {
            out.push(' ');
            out.push_str(reason);
        }
        out.push(')');
    }
    if let Some(segment) = segment_index {
        out.push_str(&format!(" at segment index {}", segment));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_upload_message_names_segment() {
        let err = Error::MediaUpload {
            message: "APPEND rejected".to_string(),
            status: Some(StatusCode::BAD_REQUEST),
            reason: Some("Bad Request".to_string()),
            segment_index: Some(3),
        };

        assert_eq!(
            err.to_string(),
            "Media upload failed: APPEND rejected (400 Bad Request) at segment index 3"
        );
    }

    #[test]
    fn domain_classification() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(Error::InvalidJson(parse).is_domain());
        assert!(Error::Domain("nope".into()).is_domain());
        assert!(!Error::InvalidArgument("nope".into()).is_domain());
    }
}

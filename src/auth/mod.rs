// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Types and functions relating to authentication with Twitter.
//!
//! Every call to Twitter carries either an OAuth 1.0a signature (for calls made on behalf of a
//! user) or a Bearer token (for application-only calls). The signing itself lives in `raw`; this
//! module holds the credentials and the handshakes that produce them.
//!
//! ## Access tokens
//!
//! To act on behalf of a user, an app goes through the three-legged flow:
//!
//! 1. [`request_token`] with the app's consumer key and a callback URL (or `"oob"` for PIN-based
//!    authorization).
//! 2. Send the user to [`authorize_url`] (or [`authenticate_url`] for "Sign in with Twitter").
//! 3. Trade the request token and the verifier Twitter hands back for an access token with
//!    [`access_token`].
//!
//! The [`Twitter`] client exposes the same steps as methods, using its own transport.
//!
//! ## Bearer tokens
//!
//! [`bearer_token`] trades the consumer key for an application-only token. Bearer tokens can't
//! post, upload media, or do anything else that needs a user; the client reports that as a
//! `Domain` error before sending anything.
//!
//! [`request_token`]: fn.request_token.html
//! [`authorize_url`]: fn.authorize_url.html
//! [`authenticate_url`]: fn.authenticate_url.html
//! [`access_token`]: fn.access_token.html
//! [`bearer_token`]: fn.bearer_token.html
//! [`Twitter`]: ../struct.Twitter.html

use std::borrow::Cow;

use hyper::{Body, Method, Request};
use serde::Deserialize;

use crate::common::*;
use crate::error::{Error, Result};
use crate::links;
use crate::transport::Transport;

pub(crate) mod raw;

/// A key/secret pair representing an OAuth token.
///
/// This struct is used as part of the authentication process. You'll need to manually create at
/// least one of these, to hold onto your consumer token.
///
/// For more information, see the documentation for [Tokens][].
///
/// [Tokens]: enum.Token.html
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// A key used to identify an application or user.
    pub key: Cow<'static, str>,
    /// A private key used to sign messages from an application or user.
    pub secret: Cow<'static, str>,
}

impl KeyPair {
    /// Creates a KeyPair with the given key and secret.
    ///
    /// This can be called with either `&'static str` (a string literal) or `String` for either
    /// parameter.
    pub fn new<K, S>(key: K, secret: S) -> KeyPair
    where
        K: Into<Cow<'static, str>>,
        S: Into<Cow<'static, str>>,
    {
        KeyPair {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Internal function to create an empty KeyPair. Not meant to be used from user code.
    fn empty() -> KeyPair {
        KeyPair {
            key: "".into(),
            secret: "".into(),
        }
    }
}

/// A token that can be used to sign requests to Twitter.
///
/// An `Access` token signs each request with OAuth 1.0a on behalf of a user. A `Bearer` token
/// authorizes the application alone, and only works with read-only endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An OAuth Access token indicating the request is coming from a specific user.
    Access {
        /// A "consumer" key/secret that represents the application sending the request.
        consumer: KeyPair,
        /// An "access" key/secret that represents the user's authorization of the application.
        access: KeyPair,
    },
    /// An OAuth Bearer token indicating the request is coming from the application itself, not a
    /// particular user.
    Bearer(String),
}

impl Token {
    /// Returns whether this token can sign calls made on behalf of a user.
    pub fn is_user_context(&self) -> bool {
        matches!(self, Token::Access { .. })
    }
}

/// The result of a successful `access_token` exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    /// The token to sign further calls with.
    pub token: Token,
    /// The numeric ID of the user who authorized the app.
    pub user_id: u64,
    /// The screen name of the user who authorized the app.
    pub screen_name: String,
}

/// With the given consumer KeyPair, ask Twitter for a request KeyPair that can be used to request
/// access to the user's account.
///
/// The callback is the URL Twitter redirects the user to once they authorize the app; use `"oob"`
/// for PIN-based authorization.
pub async fn request_token<S: Into<String>>(
    transport: &dyn Transport,
    con_token: &KeyPair,
    callback: S,
) -> Result<KeyPair> {
    let request = raw::RequestBuilder::new(Method::POST, links::auth::REQUEST_TOKEN)
        .oauth_callback(callback.into())
        .request_keys(con_token, None)?;

    let body = text_request(transport, request).await?;

    let mut key: Option<String> = None;
    let mut secret: Option<String> = None;

    for (k, v) in url::form_urlencoded::parse(body.as_bytes()) {
        match k.as_ref() {
            "oauth_token" => key = Some(v.into_owned()),
            "oauth_token_secret" => secret = Some(v.into_owned()),
            _ => (),
        }
    }

    match (key, secret) {
        (Some(key), Some(secret)) => Ok(KeyPair::new(key, secret)),
        _ => Err(Error::Domain(format!(
            "request_token response is missing the token or its secret: {}",
            body
        ))),
    }
}

/// With the given request KeyPair, return a URL that a user can access to accept or reject an
/// authorization request.
pub fn authorize_url(request_token: &KeyPair) -> String {
    format!(
        "{}?oauth_token={}",
        links::auth::AUTHORIZE,
        percent_encode(&request_token.key)
    )
}

/// With the given request KeyPair, return a URL to redirect a user to so that they can accept or
/// reject an authorization request. Users who have already authorized the app are sent straight
/// back to the callback.
pub fn authenticate_url(request_token: &KeyPair) -> String {
    format!(
        "{}?oauth_token={}",
        links::auth::AUTHENTICATE,
        percent_encode(&request_token.key)
    )
}

/// With the given OAuth tokens and verifier, ask Twitter for an access KeyPair that can be used
/// to sign further requests to the Twitter API.
pub async fn access_token<S: Into<String>>(
    transport: &dyn Transport,
    con_token: KeyPair,
    request_token: &KeyPair,
    verifier: S,
) -> Result<AccessGrant> {
    let request = raw::RequestBuilder::new(Method::POST, links::auth::ACCESS_TOKEN)
        .oauth_verifier(verifier.into())
        .request_keys(&con_token, Some(request_token))?;

    let body = text_request(transport, request).await?;

    let mut key: Option<String> = None;
    let mut secret: Option<String> = None;
    let mut id: Option<u64> = None;
    let mut username: Option<String> = None;

    for (k, v) in url::form_urlencoded::parse(body.as_bytes()) {
        match k.as_ref() {
            "oauth_token" => key = Some(v.into_owned()),
            "oauth_token_secret" => secret = Some(v.into_owned()),
            "user_id" => id = v.parse().ok(),
            "screen_name" => username = Some(v.into_owned()),
            _ => (),
        }
    }

    match (key, secret, id, username) {
        (Some(key), Some(secret), Some(user_id), Some(screen_name)) => Ok(AccessGrant {
            token: Token::Access {
                consumer: con_token,
                access: KeyPair::new(key, secret),
            },
            user_id,
            screen_name,
        }),
        _ => Err(Error::Domain(format!(
            "access_token response is incomplete: {}",
            body
        ))),
    }
}

#[derive(Deserialize)]
struct BearerResponse {
    #[serde(default)]
    token_type: Option<String>,
    access_token: String,
}

/// With the given consumer KeyPair, request the current Bearer token to perform Application-only
/// authentication.
pub async fn bearer_token(transport: &dyn Transport, con_token: &KeyPair) -> Result<Token> {
    let content = "application/x-www-form-urlencoded;charset=UTF-8";
    let request = raw::RequestBuilder::new(Method::POST, links::auth::BEARER_TOKEN)
        .with_body("grant_type=client_credentials", content)
        .request_consumer_bearer(con_token)?;

    let body = text_request(transport, request).await?;
    let decoded: BearerResponse = serde_json::from_str(&body).map_err(Error::InvalidJson)?;

    match decoded.token_type.as_deref() {
        Some("bearer") | None => Ok(Token::Bearer(decoded.access_token)),
        Some(other) => Err(Error::Domain(format!(
            "expected a bearer token, received a {} token",
            other
        ))),
    }
}

/// Invalidate the given Bearer token using the given consumer KeyPair. Upon success, the future
/// returned by this function yields the Token that was just invalidated.
pub async fn invalidate_bearer(
    transport: &dyn Transport,
    con_token: &KeyPair,
    token: &Token,
) -> Result<Token> {
    let token = match token {
        Token::Bearer(b) => b,
        Token::Access { .. } => {
            return Err(Error::InvalidArgument(
                "invalidate_bearer needs a Bearer token".to_string(),
            ))
        }
    };

    let params = ParamList::new().add_param("access_token", token.clone());
    let request = raw::RequestBuilder::new(Method::POST, links::auth::INVALIDATE_BEARER)
        .with_body_params(&params)
        .request_consumer_bearer(con_token)?;

    let body = text_request(transport, request).await?;
    let decoded: BearerResponse = serde_json::from_str(&body).map_err(Error::InvalidJson)?;

    Ok(Token::Bearer(decoded.access_token))
}

/// Sends a request whose response isn't necessarily JSON, failing on any non-success status.
async fn text_request(transport: &dyn Transport, request: Request<Body>) -> Result<String> {
    let resp = transport.send(request).await?;
    let status = resp.status();
    let body = hyper::body::to_bytes(resp.into_body()).await?;
    let body = String::from_utf8_lossy(&body).into_owned();

    if !status.is_success() {
        return Err(Error::Domain(format!(
            "authorization request failed with {}: {}",
            status, body
        )));
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use hyper::StatusCode;

    #[test]
    fn authorize_urls() {
        let request = KeyPair::new("Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik", "secret");
        assert_eq!(
            authorize_url(&request),
            "https://api.twitter.com/oauth/authorize?oauth_token=Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik"
        );
        assert!(authenticate_url(&request).starts_with("https://api.twitter.com/oauth/authenticate?"));
    }

    #[tokio::test]
    async fn three_legged_flow() {
        let transport = MockTransport::new();
        transport
            .respond(
                StatusCode::OK,
                "oauth_token=req-key&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
            )
            .respond(
                StatusCode::OK,
                "oauth_token=6253282-acc&oauth_token_secret=acc-secret&user_id=6253282&screen_name=twitterapi",
            );
        let consumer = KeyPair::new("con-key", "con-secret");

        let request = request_token(&transport, &consumer, "oob").await.unwrap();
        assert_eq!(request, KeyPair::new("req-key", "req-secret"));

        let grant = access_token(&transport, consumer.clone(), &request, "1234567")
            .await
            .unwrap();
        assert_eq!(grant.user_id, 6253282);
        assert_eq!(grant.screen_name, "twitterapi");
        assert_eq!(
            grant.token,
            Token::Access {
                consumer,
                access: KeyPair::new("6253282-acc", "acc-secret"),
            }
        );

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].authorization.as_ref().unwrap().contains("oauth_callback=\"oob\""));
        assert!(sent[1].authorization.as_ref().unwrap().contains("oauth_verifier=\"1234567\""));
        assert!(sent[1].authorization.as_ref().unwrap().contains("oauth_token=\"req-key\""));
    }

    #[tokio::test]
    async fn bearer_round_trip() {
        let transport = MockTransport::new();
        transport
            .respond(StatusCode::OK, r#"{"token_type":"bearer","access_token":"AAAA%2FAAA"}"#)
            .respond(StatusCode::OK, r#"{"access_token":"AAAA%2FAAA"}"#);
        let consumer = KeyPair::new("con-key", "con-secret");

        let token = bearer_token(&transport, &consumer).await.unwrap();
        assert_eq!(token, Token::Bearer("AAAA%2FAAA".to_string()));
        assert!(!token.is_user_context());

        let gone = invalidate_bearer(&transport, &consumer, &token).await.unwrap();
        assert_eq!(gone, token);

        let sent = transport.sent();
        assert_eq!(sent[0].body, "grant_type=client_credentials");
        assert!(sent[0].authorization.as_ref().unwrap().starts_with("Basic "));
        assert_eq!(sent[1].param("access_token").as_deref(), Some("AAAA%2FAAA"));
    }

    #[tokio::test]
    async fn rejected_handshake_is_domain_error() {
        let transport = MockTransport::new();
        transport.respond(StatusCode::UNAUTHORIZED, "Invalid request token.");

        let err = request_token(&transport, &KeyPair::new("k", "s"), "oob")
            .await
            .unwrap_err();
        assert!(err.is_domain());
    }
}

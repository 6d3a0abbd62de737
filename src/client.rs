// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The client that every call goes through, and its configuration.
//!
//! A [`Twitter`] owns one transport, one set of credentials and one [`Config`]. It signs and sends
//! each call, and wraps whatever comes back in a [`Response`]. The endpoints themselves are grouped
//! into sub-clients borrowed from it:
//!
//! ```rust,no_run
//! # async fn doc() -> fledgling::error::Result<()> {
//! use fledgling::{Config, Options, Twitter};
//!
//! let twitter = Twitter::new(Config::from_env());
//! let timeline = twitter
//!     .statuses()
//!     .user_timeline("rustlang", Some(&Options::new().set("count", 5)))
//!     .await?;
//! println!("{}", timeline.raw_body().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! Endpoints that don't have a method of their own can be reached with [`Twitter::get`] and
//! [`Twitter::post`], which pass the given options through without filtering.
//!
//! [`Twitter`]: struct.Twitter.html
//! [`Config`]: struct.Config.html
//! [`Response`]: struct.Response.html
//! [`Twitter::get`]: struct.Twitter.html#method.get
//! [`Twitter::post`]: struct.Twitter.html#method.post

use std::time::Duration;

use hyper::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::account::Account;
use crate::auth::{self, raw, AccessGrant, KeyPair, Token};
use crate::common::*;
use crate::direct::DirectMessages;
use crate::error::{Error, Result};
use crate::links;
use crate::media::Media;
use crate::options::Options;
use crate::search::Search;
use crate::service::{Application, Help};
use crate::transport::{HyperTransport, Transport};
use crate::tweet::{Favorites, Statuses};
use crate::user::{Friendships, Relations, Users};

/// The default cap on tweet length, in characters.
pub const DEFAULT_MAX_STATUS_LENGTH: usize = 280;

/// The default size of each APPEND segment of a chunked upload: 4 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Settings for a [`Twitter`] client.
///
/// Every field has a default, so a `Config` can be deserialized from a partial table in a larger
/// configuration file. Credentials left empty are simply not used.
///
/// [`Twitter`]: struct.Twitter.html
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_key: String,
    pub access_secret: String,
    /// An application-only token. When set, it is used instead of the access key pair.
    pub bearer: Option<String>,
    /// Base URL for the REST API.
    pub api_base: String,
    /// Base URL for media uploads.
    pub upload_base: String,
    /// How long to wait for a response, in seconds. `None` waits indefinitely.
    pub timeout: Option<u64>,
    /// The longest tweet `Statuses::update` will send, in characters.
    pub max_status_length: usize,
    /// Default segment size for chunked uploads, in bytes.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_key: String::new(),
            access_secret: String::new(),
            bearer: None,
            api_base: links::API_BASE.to_string(),
            upload_base: links::UPLOAD_BASE.to_string(),
            timeout: None,
            max_status_length: DEFAULT_MAX_STATUS_LENGTH,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Reads credentials from `TWITTER_CONSUMER_KEY`, `TWITTER_CONSUMER_SECRET`,
    /// `TWITTER_ACCESS_KEY`, `TWITTER_ACCESS_SECRET` and `TWITTER_BEARER`. Everything else keeps
    /// its default.
    pub fn from_env() -> Config {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Config {
        let var = |name: &str| lookup(name).unwrap_or_default();
        Config {
            consumer_key: var("TWITTER_CONSUMER_KEY"),
            consumer_secret: var("TWITTER_CONSUMER_SECRET"),
            access_key: var("TWITTER_ACCESS_KEY"),
            access_secret: var("TWITTER_ACCESS_SECRET"),
            bearer: lookup("TWITTER_BEARER").filter(|b| !b.is_empty()),
            ..Config::default()
        }
    }

    /// The application's consumer key pair.
    pub fn consumer(&self) -> KeyPair {
        KeyPair::new(self.consumer_key.clone(), self.consumer_secret.clone())
    }

    /// The token these settings describe: the bearer token if one is set, otherwise the access key
    /// pair if both halves are set, otherwise nothing.
    pub fn token(&self) -> Option<Token> {
        if let Some(bearer) = &self.bearer {
            return Some(Token::Bearer(bearer.clone()));
        }

        if self.access_key.is_empty() || self.access_secret.is_empty() {
            return None;
        }

        Some(Token::Access {
            consumer: self.consumer(),
            access: KeyPair::new(self.access_key.clone(), self.access_secret.clone()),
        })
    }
}

/// How the parameters of a call are carried.
pub(crate) enum Payload {
    Query(ParamList),
    Form(ParamList),
    Json(Value),
}

/// A client for the Twitter REST API.
///
/// A `Twitter` owns its transport and is not `Clone`; calls made through one client are sent one
/// after another, each awaited before the next is built.
pub struct Twitter {
    config: Config,
    consumer: KeyPair,
    token: Option<Token>,
    transport: Box<dyn Transport>,
}

impl Twitter {
    /// Creates a client that talks to Twitter over HTTPS, using the credentials in `config`.
    pub fn new(config: Config) -> Twitter {
        let transport = HyperTransport::new(config.timeout.map(Duration::from_secs));
        Twitter::with_transport(config, transport)
    }

    /// Creates a client that sends everything through the given transport.
    pub fn with_transport(config: Config, transport: impl Transport + 'static) -> Twitter {
        Twitter {
            consumer: config.consumer(),
            token: config.token(),
            transport: Box::new(transport),
            config,
        }
    }

    /// Replaces the token used to sign calls.
    pub fn with_token(self, token: Token) -> Twitter {
        Twitter {
            token: Some(token),
            ..self
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The token calls are currently signed with, if any.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Begins the three-legged flow, returning a request token. See `auth::request_token`.
    pub async fn request_token(&self, callback: &str) -> Result<KeyPair> {
        auth::request_token(&*self.transport, &self.consumer, callback).await
    }

    /// Returns the URL to send a user to so they can authorize the given request token.
    pub fn authorize_url(&self, request_token: &KeyPair) -> String {
        auth::authorize_url(request_token)
    }

    /// Finishes the three-legged flow. On success the new access token is used for every
    /// following call.
    pub async fn access_token(&mut self, request_token: &KeyPair, verifier: &str) -> Result<AccessGrant> {
        let grant =
            auth::access_token(&*self.transport, self.consumer.clone(), request_token, verifier).await?;
        self.token = Some(grant.token.clone());
        Ok(grant)
    }

    /// Fetches an application-only token and signs every following call with it.
    pub async fn bearer_token(&mut self) -> Result<Token> {
        let token = auth::bearer_token(&*self.transport, &self.consumer).await?;
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Invalidates the current bearer token, leaving the client without a token.
    pub async fn invalidate_bearer(&mut self) -> Result<Token> {
        let token = match &self.token {
            Some(token) => token,
            None => return Err(Error::Domain("there is no bearer token to invalidate".to_string())),
        };
        let gone = auth::invalidate_bearer(&*self.transport, &self.consumer, token).await?;
        self.token = None;
        Ok(gone)
    }

    /// Checks the current access token by loading the authenticated user's profile.
    pub async fn verify_tokens(&self) -> Result<Response> {
        self.account().verify_credentials(None).await
    }

    /// Calls the given endpoint with GET, sending every option as a query parameter.
    pub async fn get(&self, path: &str, opts: Option<&Options>) -> Result<Response> {
        let params = opts.map(Options::to_params).transpose()?.unwrap_or_default();
        self.call(Method::GET, &self.config.api_base, path, Payload::Query(params))
            .await
    }

    /// Calls the given endpoint with POST.
    ///
    /// The handful of endpoints that take JSON get the options as a JSON object; everything else
    /// gets them form-encoded.
    pub async fn post(&self, path: &str, opts: Option<&Options>) -> Result<Response> {
        let payload = if links::uses_json_body(path) {
            Payload::Json(opts.map(Options::to_json).unwrap_or_else(|| Value::Object(Default::default())))
        } else {
            Payload::Form(opts.map(Options::to_params).transpose()?.unwrap_or_default())
        };
        self.call(Method::POST, &self.config.api_base, path, payload).await
    }

    pub fn statuses(&self) -> Statuses<'_> {
        Statuses::new(self)
    }

    pub fn favorites(&self) -> Favorites<'_> {
        Favorites::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn friendships(&self) -> Friendships<'_> {
        Friendships::new(self)
    }

    /// The accounts following a user.
    pub fn followers(&self) -> Relations<'_> {
        Relations::followers(self)
    }

    /// The accounts a user follows.
    pub fn friends(&self) -> Relations<'_> {
        Relations::friends(self)
    }

    pub fn search(&self) -> Search<'_> {
        Search::new(self)
    }

    pub fn direct_messages(&self) -> DirectMessages<'_> {
        DirectMessages::new(self)
    }

    pub fn account(&self) -> Account<'_> {
        Account::new(self)
    }

    pub fn application(&self) -> Application<'_> {
        Application::new(self)
    }

    pub fn help(&self) -> Help<'_> {
        Help::new(self)
    }

    pub fn media(&self) -> Media<'_> {
        Media::new(self)
    }

    /// Fails with a `Domain` error unless calls are being signed on behalf of a user.
    pub(crate) fn require_user_context(&self, what: &str) -> Result<()> {
        match &self.token {
            Some(token) if token.is_user_context() => Ok(()),
            Some(_) => Err(Error::Domain(format!(
                "{} acts on behalf of a user and can't be called with a bearer token",
                what
            ))),
            None => Err(Error::Domain(format!(
                "{} needs an access token, and the client has none",
                what
            ))),
        }
    }

    pub(crate) async fn get_params(&self, path: &str, params: ParamList) -> Result<Response> {
        self.call(Method::GET, &self.config.api_base, path, Payload::Query(params))
            .await
    }

    pub(crate) async fn post_params(&self, path: &str, params: ParamList) -> Result<Response> {
        self.call(Method::POST, &self.config.api_base, path, Payload::Form(params))
            .await
    }

    pub(crate) async fn post_json(&self, path: &str, body: Value) -> Result<Response> {
        self.call(Method::POST, &self.config.api_base, path, Payload::Json(body))
            .await
    }

    pub(crate) async fn delete_params(&self, path: &str, params: ParamList) -> Result<Response> {
        self.call(Method::DELETE, &self.config.api_base, path, Payload::Query(params))
            .await
    }

    pub(crate) async fn upload_get(&self, params: ParamList) -> Result<Response> {
        self.call(
            Method::GET,
            &self.config.upload_base,
            links::media::UPLOAD,
            Payload::Query(params),
        )
        .await
    }

    pub(crate) async fn upload_post(&self, params: ParamList) -> Result<Response> {
        self.call(
            Method::POST,
            &self.config.upload_base,
            links::media::UPLOAD,
            Payload::Form(params),
        )
        .await
    }

    pub(crate) async fn upload_json(&self, path: &str, body: Value) -> Result<Response> {
        self.call(Method::POST, &self.config.upload_base, path, Payload::Json(body))
            .await
    }

    /// Sends an upload step, handing back the reply without decoding it.
    pub(crate) async fn upload_step(&self, params: ParamList) -> Result<RawReply> {
        self.send(
            Method::POST,
            &self.config.upload_base,
            links::media::UPLOAD,
            Payload::Form(params),
        )
        .await
    }

    /// Builds, signs and sends a single call.
    async fn call(&self, method: Method, base: &str, path: &str, payload: Payload) -> Result<Response> {
        self.send(method, base, path, payload).await?.into_response()
    }

    async fn send(&self, method: Method, base: &str, path: &str, payload: Payload) -> Result<RawReply> {
        let url = links::resolve(base, path)?;
        let token = self.token.as_ref().ok_or_else(|| {
            Error::Domain(format!("no token available to sign a call to {}", path))
        })?;

        let builder = raw::RequestBuilder::new(method, &url);
        let builder = match &payload {
            Payload::Query(params) => builder.with_query_params(params),
            Payload::Form(params) => builder.with_body_params(params),
            Payload::Json(body) => builder.with_body_json(body)?,
        };
        let request = builder.request_token(token)?;

        let reply = RawReply::from_hyper(self.transport.send(request).await?).await?;
        log::trace!(
            "{} {}: {} ({})",
            path,
            reply.status,
            RateLimit::from_headers(&reply.headers),
            url
        );

        Ok(reply)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use hyper::StatusCode;
    use serde_json::json;

    pub(crate) fn user_config() -> Config {
        Config {
            consumer_key: "con-key".into(),
            consumer_secret: "con-secret".into(),
            access_key: "acc-key".into(),
            access_secret: "acc-secret".into(),
            ..Config::default()
        }
    }

    #[test]
    fn config_defaults() {
        let config: Config = serde_json::from_value(json!({ "consumer_key": "abc" })).unwrap();
        assert_eq!(config.consumer_key, "abc");
        assert_eq!(config.api_base, links::API_BASE);
        assert_eq!(config.upload_base, links::UPLOAD_BASE);
        assert_eq!(config.max_status_length, 280);
        assert_eq!(config.chunk_size, 4 * 1024 * 1024);
        assert_eq!(config.timeout, None);
        assert_eq!(config.token(), None);
    }

    #[test]
    fn config_from_lookup() {
        let config = Config::from_lookup(|name| match name {
            "TWITTER_CONSUMER_KEY" => Some("ck".to_string()),
            "TWITTER_CONSUMER_SECRET" => Some("cs".to_string()),
            "TWITTER_ACCESS_KEY" => Some("ak".to_string()),
            "TWITTER_ACCESS_SECRET" => Some("as".to_string()),
            _ => None,
        });
        assert_eq!(
            config.token(),
            Some(Token::Access {
                consumer: KeyPair::new("ck", "cs"),
                access: KeyPair::new("ak", "as"),
            })
        );

        let config = Config::from_lookup(|name| match name {
            "TWITTER_BEARER" => Some("AAAA".to_string()),
            "TWITTER_ACCESS_KEY" => Some("ak".to_string()),
            "TWITTER_ACCESS_SECRET" => Some("as".to_string()),
            _ => None,
        });
        assert_eq!(config.token(), Some(Token::Bearer("AAAA".to_string())));
    }

    #[tokio::test]
    async fn generic_get_passes_options_through() {
        let transport = MockTransport::new();
        transport.respond(StatusCode::OK, r#"{"ok":true}"#);
        let twitter = Twitter::with_transport(user_config(), transport.clone());

        let opts = Options::new().set("anything", "goes").set("count", 3);
        let resp = twitter.get("some/endpoint", Some(&opts)).await.unwrap();
        assert_eq!(resp.get("ok"), Some(&json!(true)));

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::GET);
        assert_eq!(
            sent[0].uri,
            "https://api.twitter.com/1.1/some/endpoint.json?anything=goes&count=3"
        );
        assert!(sent[0].authorization.as_ref().unwrap().starts_with("OAuth "));
    }

    #[tokio::test]
    async fn parameterless_get_has_no_query() {
        let transport = MockTransport::new();
        transport
            .respond(StatusCode::OK, "{}")
            .respond(StatusCode::OK, "[]");
        let twitter = Twitter::with_transport(user_config(), transport.clone());

        twitter.get("account/settings", None).await.unwrap();
        twitter.statuses().home_timeline(None).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].uri, "https://api.twitter.com/1.1/account/settings.json");
        assert_eq!(
            sent[1].uri,
            "https://api.twitter.com/1.1/statuses/home_timeline.json"
        );
    }

    #[tokio::test]
    async fn generic_post_picks_body_encoding() {
        let transport = MockTransport::new();
        transport
            .respond(StatusCode::OK, "{}")
            .respond(StatusCode::OK, "{}");
        let twitter = Twitter::with_transport(user_config(), transport.clone());

        let opts = Options::new().set("status", "hello there");
        twitter.post("statuses/update", Some(&opts)).await.unwrap();

        let event = Options::new().set("event", json!({ "type": "message_create" }));
        twitter
            .post("direct_messages/events/new", Some(&event))
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].content_type.as_deref(), Some(raw::FORM_CONTENT_TYPE));
        assert_eq!(sent[0].body, "status=hello%20there");
        assert_eq!(sent[1].content_type.as_deref(), Some(raw::JSON_CONTENT_TYPE));
        assert_eq!(sent[1].json(), json!({ "event": { "type": "message_create" } }));
    }

    #[tokio::test]
    async fn error_responses_are_returned() {
        let transport = MockTransport::new();
        transport.respond(
            StatusCode::FORBIDDEN,
            crate::common::tests::load_file("sample_payloads/errors.json"),
        );
        let twitter = Twitter::with_transport(user_config(), transport);

        let resp = twitter.post("statuses/update", None).await.unwrap();
        assert!(resp.is_error());
        assert_eq!(resp.errors().unwrap()[0].code, 187);
    }

    #[tokio::test]
    async fn user_context_is_checked() {
        let transport = MockTransport::new();
        let twitter = Twitter::with_transport(Config::default(), transport.clone());
        assert!(twitter.require_user_context("test").unwrap_err().is_domain());
        assert!(twitter.get("help/configuration", None).await.unwrap_err().is_domain());

        let twitter = twitter.with_token(Token::Bearer("AAAA".to_string()));
        assert!(twitter.require_user_context("test").unwrap_err().is_domain());

        let twitter = Twitter::with_transport(user_config(), transport.clone());
        assert!(twitter.require_user_context("test").is_ok());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn bearer_flow_swaps_tokens() {
        let transport = MockTransport::new();
        transport
            .respond(StatusCode::OK, r#"{"token_type":"bearer","access_token":"AAAA"}"#)
            .respond(StatusCode::OK, "{}")
            .respond(StatusCode::OK, r#"{"access_token":"AAAA"}"#);
        let mut twitter = Twitter::with_transport(Config::default(), transport.clone());

        twitter.bearer_token().await.unwrap();
        twitter.get("help/configuration", None).await.unwrap();
        assert_eq!(
            transport.sent()[1].authorization.as_deref(),
            Some("Bearer AAAA")
        );

        twitter.invalidate_bearer().await.unwrap();
        assert!(twitter.token().is_none());
    }
}

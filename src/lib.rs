// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A library for interacting with Twitter's v1.1 REST API.
//!
//! Every call goes through a [`Twitter`] client, which holds your credentials, signs each request
//! and hands back a [`Response`]. Endpoints are grouped by what they act on, behind methods on the
//! client:
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> fledgling::error::Result<()> {
//! use fledgling::{Config, Options, Twitter};
//!
//! let twitter = Twitter::new(Config::from_env());
//!
//! let me = twitter.verify_tokens().await?;
//! println!("Logged in as @{}", me.get("screen_name").and_then(|s| s.as_str()).unwrap_or("?"));
//!
//! let posted = twitter.statuses().update("Hello from Rust!", None).await?;
//! if let Some(rate) = posted.rate_limit() {
//!     println!("{}", rate);
//! }
//!
//! let opts = Options::new().set("count", 10).set("result_type", "recent");
//! let found = twitter.search().tweets("#rustlang", Some(&opts)).await?;
//! println!("{}", found.raw_body().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! # Credentials
//!
//! [`Config`] holds the consumer key and secret of your app, and either an access token pair
//! (for calls on behalf of a user) or a bearer token (for application-only calls). It can be read
//! from `TWITTER_*` environment variables with `Config::from_env`, or deserialized from any format
//! `serde` supports. The [`auth`] module has the handshakes that produce tokens; the client
//! exposes them as `request_token`, `access_token` and `bearer_token`.
//!
//! # Responses and errors
//!
//! Any response Twitter sends back is returned as a [`Response`], including ones with an error
//! status; check `is_success` and read `errors` to see what Twitter objected to. The [`Error`]
//! type covers everything else: input rejected before anything was sent, unreadable media, a
//! network failure, or a response that isn't the JSON it should be.
//!
//! Optional parameters are given as an [`Options`] map. Each endpoint only passes along the
//! options it knows, coerced to the types Twitter expects.
//!
//! [`Twitter`]: struct.Twitter.html
//! [`Response`]: struct.Response.html
//! [`Config`]: struct.Config.html
//! [`Options`]: struct.Options.html
//! [`Error`]: error/enum.Error.html
//! [`auth`]: auth/index.html

#![warn(unused_extern_crates)]
#![warn(unused_qualifications)]

mod common;
mod client;
mod links;
mod transport;

pub mod account;
pub mod auth;
pub mod direct;
pub mod error;
pub mod media;
pub mod options;
pub mod search;
pub mod service;
pub mod tweet;
pub mod user;

pub use crate::auth::{AccessGrant, KeyPair, Token};
pub use crate::client::{Config, Twitter, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_STATUS_LENGTH};
pub use crate::common::{Headers, ParamList, RateLimit, Response};
pub use crate::options::Options;
pub use crate::transport::{HyperTransport, Transport};

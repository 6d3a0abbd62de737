// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Methods to inquire about the Twitter service itself.

use serde::Deserialize;

use crate::client::Twitter;
use crate::common::*;
use crate::error::Result;
use crate::links;
use crate::options::{self, Kind, Options, Rules};

const RATE_LIMIT_RULES: Rules = &[("resources", Kind::Str)];

/// Represents a service configuration from Twitter, as returned by `Help::configuration`.
///
/// ```rust,no_run
/// # async fn doc(twitter: &fledgling::Twitter) -> fledgling::error::Result<()> {
/// use fledgling::service::Configuration;
///
/// let config: Configuration = twitter.help().configuration().await?.decode()?;
/// println!("t.co links are {} characters", config.short_url_length_https);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    /// The character limit in direct messages.
    pub dm_text_character_limit: i32,
    /// The maximum length for a t.co URL when given a URL with protocol `http`.
    pub short_url_length: i32,
    /// The maximum length for a t.co URL when given a URL with protocol `https`.
    pub short_url_length_https: i32,
    /// The largest photo, in bytes, that can be uploaded.
    #[serde(default)]
    pub photo_size_limit: Option<u64>,
    /// The number of characters a media attachment used to take out of a tweet.
    #[serde(default)]
    pub characters_reserved_per_media: Option<i32>,
    /// A list of URL slugs that are not valid usernames when in a URL like
    /// `https://twitter.com/[slug]`.
    #[serde(default)]
    pub non_username_paths: Vec<String>,
}

/// Calls about the calling application.
pub struct Application<'a> {
    client: &'a Twitter,
}

impl<'a> Application<'a> {
    pub(crate) fn new(client: &'a Twitter) -> Self {
        Application { client }
    }

    /// Return the current rate-limit status for every endpoint, from the point of view of the
    /// current token. Narrow it down to some resource families with the `resources` option, e.g.
    /// `"statuses,users"`.
    pub async fn rate_limit_status(&self, opts: Option<&Options>) -> Result<Response> {
        let params = options::filter(opts, RATE_LIMIT_RULES)?;
        self.client
            .get_params(links::service::RATE_LIMIT_STATUS, params)
            .await
    }
}

/// Calls about Twitter's own settings.
pub struct Help<'a> {
    client: &'a Twitter,
}

impl<'a> Help<'a> {
    pub(crate) fn new(client: &'a Twitter) -> Self {
        Help { client }
    }

    /// Return the current configuration from Twitter, including the maximum length of a t.co URL
    /// and the slugs that can't be screen names. Decode it as a [`Configuration`].
    ///
    /// From Twitter: "It is recommended applications request this endpoint when they are loaded,
    /// but no more than once a day."
    ///
    /// [`Configuration`]: struct.Configuration.html
    pub async fn configuration(&self) -> Result<Response> {
        self.client
            .get_params(links::service::CONFIG, ParamList::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;
    use crate::client::tests::user_config;
    use crate::common::tests::load_file;
    use crate::transport::mock::MockTransport;
    use hyper::StatusCode;

    #[tokio::test]
    async fn configuration_decodes() {
        let transport = MockTransport::new();
        transport.respond(StatusCode::OK, load_file("sample_payloads/configuration.json"));
        let twitter = Twitter::with_transport(user_config(), transport.clone())
            .with_token(Token::Bearer("AAAA".to_string()));

        let config: Configuration = twitter.help().configuration().await.unwrap().decode().unwrap();
        assert_eq!(config.dm_text_character_limit, 10000);
        assert_eq!(config.short_url_length_https, 23);
        assert_eq!(config.photo_size_limit, Some(3145728));
        assert!(config.non_username_paths.iter().any(|p| p == "about"));

        assert_eq!(
            transport.sent()[0].uri,
            "https://api.twitter.com/1.1/help/configuration.json"
        );
    }

    #[tokio::test]
    async fn rate_limit_status_narrowed() {
        let transport = MockTransport::new();
        transport.respond(
            StatusCode::OK,
            r#"{"resources":{"statuses":{"/statuses/show/:id":{"limit":900,"remaining":899,"reset":1403602426}}}}"#,
        );
        let twitter = Twitter::with_transport(user_config(), transport.clone());

        let opts = Options::new().set("resources", "statuses");
        let resp = twitter.application().rate_limit_status(Some(&opts)).await.unwrap();
        assert_eq!(
            resp.get("resources").map(|r| r["statuses"]["/statuses/show/:id"]["limit"].clone()),
            Some(serde_json::json!(900))
        );
        assert_eq!(
            transport.sent()[0].uri,
            "https://api.twitter.com/1.1/application/rate_limit_status.json?resources=statuses"
        );
    }
}

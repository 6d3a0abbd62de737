// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Functions for inspecting and changing the authenticated user's account.
//!
//! All of these act on the user whose access token signs the call, so none of them work with a
//! bearer token.

use crate::client::Twitter;
use crate::common::*;
use crate::error::Result;
use crate::links;
use crate::options::{self, Kind, Options, Rules};

const VERIFY_RULES: Rules = &[
    ("include_entities", Kind::Bool),
    ("skip_status", Kind::Bool),
    ("include_email", Kind::Bool),
];

const UPDATE_PROFILE_RULES: Rules = &[
    ("name", Kind::Str),
    ("url", Kind::Str),
    ("location", Kind::Str),
    ("description", Kind::Str),
    ("profile_link_color", Kind::Str),
    ("include_entities", Kind::Bool),
    ("skip_status", Kind::Bool),
];

/// Calls on the authenticated user's own account.
pub struct Account<'a> {
    client: &'a Twitter,
}

impl<'a> Account<'a> {
    pub(crate) fn new(client: &'a Twitter) -> Self {
        Account { client }
    }

    /// Load the authenticated user's profile. A successful response means the access token is
    /// still good.
    pub async fn verify_credentials(&self, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("account/verify_credentials")?;
        let params = options::filter(opts, VERIFY_RULES)?;
        self.client
            .get_params(links::account::VERIFY_CREDENTIALS, params)
            .await
    }

    /// Load the authenticated user's account settings: language, time zone, sleep time and the
    /// like.
    pub async fn settings(&self) -> Result<Response> {
        self.client.require_user_context("account/settings")?;
        self.client
            .get_params(links::account::SETTINGS, ParamList::new())
            .await
    }

    /// Change the profile fields given in the options: `name`, `url`, `location`, `description`
    /// and `profile_link_color`. Fields that aren't given are left as they are.
    pub async fn update_profile(&self, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("account/update_profile")?;
        let params = options::filter(opts, UPDATE_PROFILE_RULES)?;
        self.client
            .post_params(links::account::UPDATE_PROFILE, params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::user_config;
    use crate::common::tests::load_file;
    use crate::transport::mock::MockTransport;
    use hyper::{Method, StatusCode};

    #[tokio::test]
    async fn account_calls() {
        let transport = MockTransport::new();
        transport
            .respond_with_headers(
                StatusCode::OK,
                vec![
                    ("x-rate-limit-limit", "75".to_string()),
                    ("x-rate-limit-remaining", "74".to_string()),
                    ("x-rate-limit-reset", "1403602426".to_string()),
                ],
                load_file("sample_payloads/user.json"),
            )
            .respond(StatusCode::OK, r#"{"language":"en","protected":false}"#)
            .respond(StatusCode::OK, load_file("sample_payloads/user.json"));
        let twitter = Twitter::with_transport(user_config(), transport.clone());

        let me = twitter
            .account()
            .verify_credentials(Some(&Options::new().set("skip_status", "1")))
            .await
            .unwrap();
        assert_eq!(me.get("screen_name").and_then(|s| s.as_str()), Some("twitterapi"));
        assert_eq!(me.rate_limit().and_then(|r| r.remaining), Some(74));

        let settings = twitter.account().settings().await.unwrap();
        assert_eq!(settings.get("language").and_then(|s| s.as_str()), Some("en"));

        let opts = Options::new()
            .set("description", "The Real Twitter API.")
            .set("screen_name", "ignored");
        twitter.account().update_profile(Some(&opts)).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].param("skip_status").as_deref(), Some("true"));
        assert_eq!(sent[1].uri, "https://api.twitter.com/1.1/account/settings.json");
        assert_eq!(sent[2].method, Method::POST);
        assert_eq!(sent[2].param("description").as_deref(), Some("The Real Twitter API."));
        assert_eq!(sent[2].param("screen_name"), None);
    }

    #[tokio::test]
    async fn verify_tokens_loads_profile() {
        let transport = MockTransport::new();
        transport.respond(StatusCode::OK, load_file("sample_payloads/user.json"));
        let twitter = Twitter::with_transport(user_config(), transport.clone());

        let me = twitter.verify_tokens().await.unwrap();
        assert_eq!(me.get("id_str").and_then(|s| s.as_str()), Some("6253282"));
        assert_eq!(
            transport.sent()[0].uri,
            "https://api.twitter.com/1.1/account/verify_credentials.json"
        );
    }
}

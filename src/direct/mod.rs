// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Structs and methods for working with direct messages.
//!
//! Note that direct message access requires a special permissions level above regular read/write
//! access. Your app must be configured to have "read, write, and direct message" access to use any
//! function in this module, even the read-only ones. None of them work with a bearer token.
//!
//! Messages are sent and loaded as "events". Sending one posts a JSON `message_create` event
//! rather than a form, and deleting one uses the HTTP `DELETE` verb; both are handled here.

use serde_json::{json, Value};

use crate::client::Twitter;
use crate::common::*;
use crate::error::{Error, Result};
use crate::links;
use crate::options::{self, Kind, Options, Rules};

/// The longest direct message Twitter accepts, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

const LIST_RULES: Rules = &[("count", Kind::Int), ("cursor", Kind::Str)];

/// Builds the `message_create` event for a message to the given user.
fn message_event(recipient_id: u64, text: &str, media_id: Option<u64>) -> Result<Value> {
    if text.is_empty() {
        return Err(Error::InvalidArgument("message text is empty".to_string()));
    }
    let len = text.chars().count();
    if len > MAX_MESSAGE_LENGTH {
        return Err(Error::InvalidArgument(format!(
            "message text is {} characters long, the limit is {}",
            len, MAX_MESSAGE_LENGTH
        )));
    }

    let mut message_data = json!({ "text": text });
    if let Some(media_id) = media_id {
        message_data["attachment"] = json!({
            "type": "media",
            "media": { "id": media_id.to_string() },
        });
    }

    Ok(json!({
        "event": {
            "type": "message_create",
            "message_create": {
                "target": { "recipient_id": recipient_id.to_string() },
                "message_data": message_data,
            },
        },
    }))
}

/// Calls for sending and loading direct messages.
pub struct DirectMessages<'a> {
    client: &'a Twitter,
}

impl<'a> DirectMessages<'a> {
    pub(crate) fn new(client: &'a Twitter) -> Self {
        DirectMessages { client }
    }

    /// Send a direct message to the given user.
    pub async fn send(&self, recipient_id: u64, text: &str) -> Result<Response> {
        self.client.require_user_context("direct_messages/events/new")?;
        let event = message_event(recipient_id, text, None)?;
        self.client.post_json(links::direct::SEND, event).await
    }

    /// Send a direct message with an attachment. The media must have been uploaded for use in a
    /// DM; see `ChunkedUpload::for_dm`.
    pub async fn send_with_media(&self, recipient_id: u64, text: &str, media_id: u64) -> Result<Response> {
        self.client.require_user_context("direct_messages/events/new")?;
        let event = message_event(recipient_id, text, Some(media_id))?;
        self.client.post_json(links::direct::SEND, event).await
    }

    /// Lookup a single message by its ID.
    pub async fn show(&self, id: u64) -> Result<Response> {
        self.client.require_user_context("direct_messages/events/show")?;
        let params = ParamList::new().add_param("id", id.to_string());
        self.client.get_params(links::direct::SHOW, params).await
    }

    /// Load the messages sent and received in the last 30 days, newest first. Follow the
    /// `next_cursor` of one page with the `cursor` option.
    pub async fn list(&self, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("direct_messages/events/list")?;
        let params = options::filter(opts, LIST_RULES)?;
        self.client.get_params(links::direct::LIST, params).await
    }

    /// Delete the given message. This only removes it from the authenticated user's view of the
    /// conversation.
    pub async fn destroy(&self, id: u64) -> Result<Response> {
        self.client.require_user_context("direct_messages/events/destroy")?;
        let params = ParamList::new().add_param("id", id.to_string());
        self.client.delete_params(links::direct::DELETE, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;
    use crate::auth::raw::JSON_CONTENT_TYPE;
    use crate::client::tests::user_config;
    use crate::transport::mock::MockTransport;
    use hyper::{Method, StatusCode};

    fn client(transport: &MockTransport) -> Twitter {
        Twitter::with_transport(user_config(), transport.clone())
    }

    #[tokio::test]
    async fn send_posts_json_event() {
        let transport = MockTransport::new();
        transport.respond(StatusCode::OK, r#"{"event":{"id":"110","type":"message_create"}}"#);
        let twitter = client(&transport);

        let resp = twitter.direct_messages().send(3805104374, "Hello World!").await.unwrap();
        assert_eq!(resp.get("event").and_then(|e| e["id"].as_str()), Some("110"));

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].uri, "https://api.twitter.com/1.1/direct_messages/events/new.json");
        assert_eq!(sent[0].content_type.as_deref(), Some(JSON_CONTENT_TYPE));
        assert_eq!(
            sent[0].json(),
            json!({
                "event": {
                    "type": "message_create",
                    "message_create": {
                        "target": { "recipient_id": "3805104374" },
                        "message_data": { "text": "Hello World!" },
                    },
                },
            })
        );
    }

    #[tokio::test]
    async fn send_with_attachment() {
        let transport = MockTransport::new();
        transport.respond(StatusCode::OK, "{}");
        let twitter = client(&transport);

        twitter
            .direct_messages()
            .send_with_media(3805104374, "look", 710511363345354753)
            .await
            .unwrap();

        let body = transport.sent()[0].json();
        assert_eq!(
            body["event"]["message_create"]["message_data"]["attachment"],
            json!({ "type": "media", "media": { "id": "710511363345354753" } })
        );
    }

    #[tokio::test]
    async fn destroy_uses_delete() {
        let transport = MockTransport::new();
        transport
            .respond(StatusCode::NO_CONTENT, "")
            .respond(StatusCode::OK, r#"{"events":[]}"#);
        let twitter = client(&transport);

        let resp = twitter.direct_messages().destroy(1050118621198921728).await.unwrap();
        assert!(resp.is_success());
        assert!(resp.json().is_none());

        let opts = Options::new().set("count", 20).set("cursor", "MTA1MDExODYy");
        twitter.direct_messages().list(Some(&opts)).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::DELETE);
        assert_eq!(
            sent[0].uri,
            "https://api.twitter.com/1.1/direct_messages/events/destroy.json?id=1050118621198921728"
        );
        assert_eq!(sent[1].param("cursor").as_deref(), Some("MTA1MDExODYy"));
    }

    #[tokio::test]
    async fn rejected_before_sending() {
        let transport = MockTransport::new();
        let twitter = client(&transport);

        let err = twitter.direct_messages().send(1, "").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = twitter
            .direct_messages()
            .send(1, &"x".repeat(MAX_MESSAGE_LENGTH + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let twitter = twitter.with_token(Token::Bearer("AAAA".to_string()));
        assert!(twitter.direct_messages().list(None).await.unwrap_err().is_domain());
        assert!(transport.sent().is_empty());
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::client::Twitter;
use crate::common::*;
use crate::error::{Error, Result};
use crate::links;
use crate::options::{self, Kind, Options, Rules};

use super::*;

const SHOW_RULES: Rules = &[("include_entities", Kind::Bool)];

const LOOKUP_RULES: Rules = &[
    ("include_entities", Kind::Bool),
    ("tweet_mode", Kind::Str),
];

const SEARCH_RULES: Rules = &[
    ("page", Kind::Int),
    ("count", Kind::Int),
    ("include_entities", Kind::Bool),
];

const FOLLOW_RULES: Rules = &[("follow", Kind::Bool)];

const IDS_RULES: Rules = &[
    ("cursor", Kind::Int),
    ("stringify_ids", Kind::Bool),
    ("count", Kind::Int),
];

const LIST_RULES: Rules = &[
    ("cursor", Kind::Int),
    ("count", Kind::Int),
    ("skip_status", Kind::Bool),
    ("include_user_entities", Kind::Bool),
];

//---Profiles---

/// Calls for loading user profiles.
pub struct Users<'a> {
    client: &'a Twitter,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a Twitter) -> Self {
        Users { client }
    }

    /// Lookup user information for a single user.
    pub async fn show<T: Into<UserID>>(&self, acct: T, opts: Option<&Options>) -> Result<Response> {
        let params = options::filter(opts, SHOW_RULES)?.add_user_param(acct.into())?;
        self.client.get_params(links::users::SHOW, params).await
    }

    /// Look up profile information for up to 100 Twitter users.
    ///
    /// The batch can be given as IDs (`u64`, or numeric strings) or as screen names, but not a mix
    /// of the two in one call.
    ///
    /// ```rust,no_run
    /// # async fn doc(twitter: &fledgling::Twitter) -> fledgling::error::Result<()> {
    /// let users = twitter.users().lookup(vec!["rustlang", "ThisWeekInRust"], None).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn lookup<T, I>(&self, accts: I, opts: Option<&Options>) -> Result<Response>
    where
        T: Into<UserID>,
        I: IntoIterator<Item = T>,
    {
        let (key, value) = batch_param(accts)?;
        let params = options::filter(opts, LOOKUP_RULES)?.add_param(key, value);
        self.client.post_params(links::users::LOOKUP, params).await
    }

    /// Search for users, the way the "People" tab of twitter.com does. Results come a page at a
    /// time; ask for later pages with the `page` option.
    pub async fn search(&self, query: &str, opts: Option<&Options>) -> Result<Response> {
        if query.trim().is_empty() {
            return Err(Error::InvalidArgument("user search query is empty".to_string()));
        }
        let params = options::filter(opts, SEARCH_RULES)?.add_param("q", query.to_string());
        self.client.get_params(links::users::SEARCH, params).await
    }
}

//---Relationships---

/// Calls for following users and inspecting who follows whom.
pub struct Friendships<'a> {
    client: &'a Twitter,
}

impl<'a> Friendships<'a> {
    pub(crate) fn new(client: &'a Twitter) -> Self {
        Friendships { client }
    }

    /// Follow the given account with the authenticated user. Set the `follow` option to also
    /// enable notifications for the target account.
    ///
    /// Following a protected account sends a follow request instead.
    pub async fn create<T: Into<UserID>>(&self, acct: T, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("friendships/create")?;
        let params = options::filter(opts, FOLLOW_RULES)?.add_user_param(acct.into())?;
        self.client.post_params(links::users::FOLLOW, params).await
    }

    /// Unfollow the given account with the authenticated user.
    pub async fn destroy<T: Into<UserID>>(&self, acct: T) -> Result<Response> {
        self.client.require_user_context("friendships/destroy")?;
        let params = ParamList::new().add_user_param(acct.into())?;
        self.client.post_params(links::users::UNFOLLOW, params).await
    }

    /// Lookup relationship settings between two arbitrary users.
    pub async fn show<F, T>(&self, from: F, to: T) -> Result<Response>
    where
        F: Into<UserID>,
        T: Into<UserID>,
    {
        let (source_key, source) = from.into().into_prefixed_param("source")?;
        let (target_key, target) = to.into().into_prefixed_param("target")?;
        let params = ParamList::new()
            .add_param(source_key, source)
            .add_param(target_key, target);
        self.client.get_params(links::users::FRIENDSHIP_SHOW, params).await
    }

    /// Lookup the relations between the authenticated user and up to 100 given accounts.
    pub async fn lookup<T, I>(&self, accts: I) -> Result<Response>
    where
        T: Into<UserID>,
        I: IntoIterator<Item = T>,
    {
        self.client.require_user_context("friendships/lookup")?;
        let (key, value) = batch_param(accts)?;
        let params = ParamList::new().add_param(key, value);
        self.client.get_params(links::users::FRIENDSHIP_LOOKUP, params).await
    }
}

//---Groups of users---

/// Calls for paging through the accounts on one side of a user's follow graph: either the
/// accounts following them, or the accounts they follow.
pub struct Relations<'a> {
    client: &'a Twitter,
    ids_path: &'static str,
    list_path: &'static str,
}

impl<'a> Relations<'a> {
    pub(crate) fn followers(client: &'a Twitter) -> Self {
        Relations {
            client,
            ids_path: links::users::FOLLOWERS_IDS,
            list_path: links::users::FOLLOWERS_LIST,
        }
    }

    pub(crate) fn friends(client: &'a Twitter) -> Self {
        Relations {
            client,
            ids_path: links::users::FRIENDS_IDS,
            list_path: links::users::FRIENDS_LIST,
        }
    }

    /// Lookup the IDs on this side of the given user's follow graph, or the authenticated user's
    /// if `None`. Up to 5000 come back per page; pass the `next_cursor` of one page as the
    /// `cursor` option to get the next.
    pub async fn ids(&self, acct: Option<UserID>, opts: Option<&Options>) -> Result<Response> {
        let params = self.params(acct, opts, IDS_RULES)?;
        self.client.get_params(self.ids_path, params).await
    }

    /// Like `ids`, but with full user profiles, up to 200 per page.
    pub async fn list(&self, acct: Option<UserID>, opts: Option<&Options>) -> Result<Response> {
        let params = self.params(acct, opts, LIST_RULES)?;
        self.client.get_params(self.list_path, params).await
    }

    fn params(&self, acct: Option<UserID>, opts: Option<&Options>, rules: Rules) -> Result<ParamList> {
        let params = options::filter(opts, rules)?;
        match acct {
            Some(acct) => params.add_user_param(acct),
            None => Ok(params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::user_config;
    use crate::transport::mock::MockTransport;
    use hyper::{Method, StatusCode};

    fn client(transport: &MockTransport) -> Twitter {
        Twitter::with_transport(user_config(), transport.clone())
    }

    #[tokio::test]
    async fn show_disambiguates() {
        let transport = MockTransport::new();
        transport
            .respond(StatusCode::OK, "{}")
            .respond(StatusCode::OK, "{}");
        let twitter = client(&transport);

        twitter.users().show("6253282", None).await.unwrap();
        twitter
            .users()
            .show("twitterapi", Some(&Options::new().set("include_entities", "f")))
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].uri, "https://api.twitter.com/1.1/users/show.json?user_id=6253282");
        assert_eq!(sent[1].param("screen_name").as_deref(), Some("twitterapi"));
        assert_eq!(sent[1].param("include_entities").as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn bad_names_never_sent() {
        let transport = MockTransport::new();
        let twitter = client(&transport);

        let err = twitter.users().show("not a name", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = twitter
            .users()
            .lookup(vec![UserID::from(12u64), UserID::from("jack")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = twitter.users().search("  ", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn lookup_batches() {
        let transport = MockTransport::new();
        transport
            .respond(StatusCode::OK, "[]")
            .respond(StatusCode::OK, "[]");
        let twitter = client(&transport);

        twitter.users().lookup(vec![783214u64, 6253282], None).await.unwrap();
        twitter.friendships().lookup(vec!["rustlang", "twitterapi"]).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].param("user_id").as_deref(), Some("783214,6253282"));
        assert_eq!(sent[0].param("screen_name"), None);
        assert_eq!(sent[1].method, Method::GET);
        assert_eq!(sent[1].param("screen_name").as_deref(), Some("rustlang,twitterapi"));
    }

    #[tokio::test]
    async fn friendship_calls() {
        let transport = MockTransport::new();
        transport
            .respond(StatusCode::OK, "{}")
            .respond(StatusCode::OK, "{}")
            .respond(StatusCode::OK, "{}");
        let twitter = client(&transport);

        twitter
            .friendships()
            .create("rustlang", Some(&Options::new().set("follow", true)))
            .await
            .unwrap();
        twitter.friendships().destroy(783214u64).await.unwrap();
        twitter.friendships().show("bert", 6253282u64).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].uri, "https://api.twitter.com/1.1/friendships/create.json");
        assert_eq!(sent[0].param("follow").as_deref(), Some("true"));
        assert_eq!(sent[1].param("user_id").as_deref(), Some("783214"));
        assert_eq!(sent[2].param("source_screen_name").as_deref(), Some("bert"));
        assert_eq!(sent[2].param("target_id").as_deref(), Some("6253282"));
    }

    #[tokio::test]
    async fn follow_graph() {
        let transport = MockTransport::new();
        transport
            .respond(StatusCode::OK, r#"{"ids":[],"next_cursor":0}"#)
            .respond(StatusCode::OK, r#"{"users":[],"next_cursor":0}"#);
        let twitter = client(&transport);

        let opts = Options::new().set("cursor", "-1").set("skip_status", 1);
        let ids = twitter.followers().ids(Some("rustlang".into()), Some(&opts)).await.unwrap();
        assert_eq!(ids.get("next_cursor"), Some(&serde_json::json!(0)));
        twitter.friends().list(None, Some(&opts)).await.unwrap();

        let sent = transport.sent();
        assert_eq!(
            sent[0].uri,
            "https://api.twitter.com/1.1/followers/ids.json?cursor=-1&screen_name=rustlang"
        );
        assert_eq!(
            sent[1].uri,
            "https://api.twitter.com/1.1/friends/list.json?cursor=-1&skip_status=true"
        );
    }
}

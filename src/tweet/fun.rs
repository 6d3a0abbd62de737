// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::client::Twitter;
use crate::common::*;
use crate::error::Result;
use crate::links;
use crate::options::{self, Kind, Options, Rules};
use crate::user::UserID;

use super::{id_list, validate_status_text};

const UPDATE_RULES: Rules = &[
    ("in_reply_to_status_id", Kind::Int),
    ("auto_populate_reply_metadata", Kind::Bool),
    ("exclude_reply_user_ids", Kind::IdList),
    ("attachment_url", Kind::Str),
    ("media_ids", Kind::IdList),
    ("possibly_sensitive", Kind::Bool),
    ("lat", Kind::Float),
    ("long", Kind::Float),
    ("place_id", Kind::Str),
    ("display_coordinates", Kind::Bool),
    ("trim_user", Kind::Bool),
    ("enable_dmcommands", Kind::Bool),
    ("fail_dmcommands", Kind::Bool),
    ("card_uri", Kind::Str),
];

const SHOW_RULES: Rules = &[
    ("trim_user", Kind::Bool),
    ("include_my_retweet", Kind::Bool),
    ("include_entities", Kind::Bool),
    ("include_ext_alt_text", Kind::Bool),
    ("include_card_uri", Kind::Bool),
    ("tweet_mode", Kind::Str),
];

const TRIM_RULES: Rules = &[("trim_user", Kind::Bool)];

const RETWEETS_RULES: Rules = &[("count", Kind::Int), ("trim_user", Kind::Bool)];

const RETWEETERS_RULES: Rules = &[
    ("count", Kind::Int),
    ("cursor", Kind::Int),
    ("stringify_ids", Kind::Bool),
];

const LOOKUP_RULES: Rules = &[
    ("include_entities", Kind::Bool),
    ("trim_user", Kind::Bool),
    ("map", Kind::Bool),
    ("include_ext_alt_text", Kind::Bool),
    ("include_card_uri", Kind::Bool),
    ("tweet_mode", Kind::Str),
];

const HOME_TIMELINE_RULES: Rules = &[
    ("count", Kind::Int),
    ("since_id", Kind::Int),
    ("max_id", Kind::Int),
    ("trim_user", Kind::Bool),
    ("exclude_replies", Kind::Bool),
    ("include_entities", Kind::Bool),
    ("tweet_mode", Kind::Str),
];

const MENTIONS_TIMELINE_RULES: Rules = &[
    ("count", Kind::Int),
    ("since_id", Kind::Int),
    ("max_id", Kind::Int),
    ("trim_user", Kind::Bool),
    ("include_entities", Kind::Bool),
    ("tweet_mode", Kind::Str),
];

const USER_TIMELINE_RULES: Rules = &[
    ("count", Kind::Int),
    ("since_id", Kind::Int),
    ("max_id", Kind::Int),
    ("trim_user", Kind::Bool),
    ("exclude_replies", Kind::Bool),
    ("include_rts", Kind::Bool),
    ("tweet_mode", Kind::Str),
];

const RETWEETS_OF_ME_RULES: Rules = &[
    ("count", Kind::Int),
    ("since_id", Kind::Int),
    ("max_id", Kind::Int),
    ("trim_user", Kind::Bool),
    ("include_entities", Kind::Bool),
    ("include_user_entities", Kind::Bool),
    ("tweet_mode", Kind::Str),
];

const FAVORITE_RULES: Rules = &[("include_entities", Kind::Bool)];

const FAVORITES_LIST_RULES: Rules = &[
    ("count", Kind::Int),
    ("since_id", Kind::Int),
    ("max_id", Kind::Int),
    ("include_entities", Kind::Bool),
    ("tweet_mode", Kind::Str),
];

/// Calls for posting, loading and acting on tweets.
pub struct Statuses<'a> {
    client: &'a Twitter,
}

impl<'a> Statuses<'a> {
    pub(crate) fn new(client: &'a Twitter) -> Self {
        Statuses { client }
    }

    /// Post a new tweet.
    ///
    /// The text must be non-empty and at most `Config::max_status_length` characters (280 by
    /// default). Attach media with the `media_ids` option, reply with `in_reply_to_status_id`, and
    /// place the tweet with `lat`/`long` or `place_id`.
    pub async fn update(&self, text: &str, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("statuses/update")?;
        validate_status_text(text, self.client.config().max_status_length)?;

        let params = options::filter(opts, UPDATE_RULES)?.add_param("status", text.to_string());
        self.client.post_params(links::statuses::UPDATE, params).await
    }

    /// Lookup a single tweet by numeric ID.
    pub async fn show(&self, id: u64, opts: Option<&Options>) -> Result<Response> {
        let params = options::filter(opts, SHOW_RULES)?.add_param("id", id.to_string());
        self.client.get_params(links::statuses::SHOW, params).await
    }

    /// Delete the given tweet. The authenticated user must be the tweet's author.
    pub async fn destroy(&self, id: u64, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("statuses/destroy")?;
        let params = options::filter(opts, TRIM_RULES)?;
        let path = format!("{}/{}", links::statuses::DESTROY_STEM, id);
        self.client.post_params(&path, params).await
    }

    /// Retweet the given tweet as the authenticated user.
    pub async fn retweet(&self, id: u64, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("statuses/retweet")?;
        let params = options::filter(opts, TRIM_RULES)?;
        let path = format!("{}/{}", links::statuses::RETWEET_STEM, id);
        self.client.post_params(&path, params).await
    }

    /// Undo a retweet of the given tweet.
    pub async fn unretweet(&self, id: u64, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("statuses/unretweet")?;
        let params = options::filter(opts, TRIM_RULES)?;
        let path = format!("{}/{}", links::statuses::UNRETWEET_STEM, id);
        self.client.post_params(&path, params).await
    }

    /// Lookup the most recent retweets (up to 100, set with `count`) of the given tweet.
    pub async fn retweets(&self, id: u64, opts: Option<&Options>) -> Result<Response> {
        let params = options::filter(opts, RETWEETS_RULES)?;
        let path = format!("{}/{}", links::statuses::RETWEETS_STEM, id);
        self.client.get_params(&path, params).await
    }

    /// Lookup the user IDs that have retweeted the given tweet. The result is cursored; pass the
    /// `next_cursor` of one page as the `cursor` option to get the next.
    pub async fn retweeters(&self, id: u64, opts: Option<&Options>) -> Result<Response> {
        let params = options::filter(opts, RETWEETERS_RULES)?.add_param("id", id.to_string());
        self.client.get_params(links::statuses::RETWEETERS, params).await
    }

    /// Lookup tweet information for up to 100 tweet IDs at once.
    ///
    /// Tweets that don't exist or can't be seen are left out of the result, unless the `map`
    /// option is set, in which case every requested ID shows up with a `null` for missing tweets.
    pub async fn lookup<I: IntoIterator<Item = u64>>(
        &self,
        ids: I,
        opts: Option<&Options>,
    ) -> Result<Response> {
        let params = options::filter(opts, LOOKUP_RULES)?.add_param("id", id_list(ids)?);
        self.client.post_params(links::statuses::LOOKUP, params).await
    }

    /// The authenticated user's home timeline: the tweets of everyone they follow, and their own.
    pub async fn home_timeline(&self, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("statuses/home_timeline")?;
        let params = options::filter(opts, HOME_TIMELINE_RULES)?;
        self.client.get_params(links::statuses::HOME_TIMELINE, params).await
    }

    /// Tweets mentioning the authenticated user.
    pub async fn mentions_timeline(&self, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("statuses/mentions_timeline")?;
        let params = options::filter(opts, MENTIONS_TIMELINE_RULES)?;
        self.client
            .get_params(links::statuses::MENTIONS_TIMELINE, params)
            .await
    }

    /// Tweets posted by the given user.
    pub async fn user_timeline<T: Into<UserID>>(
        &self,
        acct: T,
        opts: Option<&Options>,
    ) -> Result<Response> {
        let params = options::filter(opts, USER_TIMELINE_RULES)?.add_user_param(acct.into())?;
        self.client.get_params(links::statuses::USER_TIMELINE, params).await
    }

    /// The authenticated user's tweets that others have retweeted.
    pub async fn retweets_of_me(&self, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("statuses/retweets_of_me")?;
        let params = options::filter(opts, RETWEETS_OF_ME_RULES)?;
        self.client.get_params(links::statuses::RETWEETS_OF_ME, params).await
    }
}

/// Calls for liking tweets.
pub struct Favorites<'a> {
    client: &'a Twitter,
}

impl<'a> Favorites<'a> {
    pub(crate) fn new(client: &'a Twitter) -> Self {
        Favorites { client }
    }

    /// Like the given tweet as the authenticated user.
    pub async fn create(&self, id: u64, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("favorites/create")?;
        let params = options::filter(opts, FAVORITE_RULES)?.add_param("id", id.to_string());
        self.client.post_params(links::favorites::CREATE, params).await
    }

    /// Clear a like of the given tweet.
    pub async fn destroy(&self, id: u64, opts: Option<&Options>) -> Result<Response> {
        self.client.require_user_context("favorites/destroy")?;
        let params = options::filter(opts, FAVORITE_RULES)?.add_param("id", id.to_string());
        self.client.post_params(links::favorites::DESTROY, params).await
    }

    /// The tweets liked by the given user, or by the authenticated user if `None`.
    pub async fn list(&self, acct: Option<UserID>, opts: Option<&Options>) -> Result<Response> {
        let mut params = options::filter(opts, FAVORITES_LIST_RULES)?;
        if let Some(acct) = acct {
            params = params.add_user_param(acct)?;
        }
        self.client.get_params(links::favorites::LIST, params).await
    }
}

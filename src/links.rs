// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Base URIs and endpoint paths.

use url::Url;

use crate::error::Result;

pub const API_BASE: &str = "https://api.twitter.com/1.1/";
pub const UPLOAD_BASE: &str = "https://upload.twitter.com/1.1/";

/// Endpoints whose POST body is sent as JSON instead of `application/x-www-form-urlencoded`.
pub const JSON_BODY_ENDPOINTS: &[&str] = &[
    "direct_messages/events/new",
    "direct_messages/welcome_messages/new",
    "media/metadata/create",
    "collections/entries/curate",
];

pub mod auth {
    pub const REQUEST_TOKEN: &str = "https://api.twitter.com/oauth/request_token";
    pub const ACCESS_TOKEN: &str = "https://api.twitter.com/oauth/access_token";
    pub const AUTHORIZE: &str = "https://api.twitter.com/oauth/authorize";
    pub const AUTHENTICATE: &str = "https://api.twitter.com/oauth/authenticate";
    pub const BEARER_TOKEN: &str = "https://api.twitter.com/oauth2/token";
    pub const INVALIDATE_BEARER: &str = "https://api.twitter.com/oauth2/invalidate_token";
}

pub mod statuses {
    pub const UPDATE: &str = "statuses/update";
    pub const SHOW: &str = "statuses/show";
    pub const DESTROY_STEM: &str = "statuses/destroy";
    pub const RETWEET_STEM: &str = "statuses/retweet";
    pub const UNRETWEET_STEM: &str = "statuses/unretweet";
    pub const RETWEETS_STEM: &str = "statuses/retweets";
    pub const RETWEETERS: &str = "statuses/retweeters/ids";
    pub const LOOKUP: &str = "statuses/lookup";
    pub const HOME_TIMELINE: &str = "statuses/home_timeline";
    pub const MENTIONS_TIMELINE: &str = "statuses/mentions_timeline";
    pub const USER_TIMELINE: &str = "statuses/user_timeline";
    pub const RETWEETS_OF_ME: &str = "statuses/retweets_of_me";
}

pub mod favorites {
    pub const CREATE: &str = "favorites/create";
    pub const DESTROY: &str = "favorites/destroy";
    pub const LIST: &str = "favorites/list";
}

pub mod users {
    pub const SHOW: &str = "users/show";
    pub const LOOKUP: &str = "users/lookup";
    pub const SEARCH: &str = "users/search";
    pub const FOLLOW: &str = "friendships/create";
    pub const UNFOLLOW: &str = "friendships/destroy";
    pub const FRIENDSHIP_SHOW: &str = "friendships/show";
    pub const FRIENDSHIP_LOOKUP: &str = "friendships/lookup";
    pub const FOLLOWERS_IDS: &str = "followers/ids";
    pub const FOLLOWERS_LIST: &str = "followers/list";
    pub const FRIENDS_IDS: &str = "friends/ids";
    pub const FRIENDS_LIST: &str = "friends/list";
}

pub mod search {
    pub const TWEETS: &str = "search/tweets";
}

pub mod direct {
    pub const SEND: &str = "direct_messages/events/new";
    pub const SHOW: &str = "direct_messages/events/show";
    pub const LIST: &str = "direct_messages/events/list";
    pub const DELETE: &str = "direct_messages/events/destroy";
}

pub mod account {
    pub const VERIFY_CREDENTIALS: &str = "account/verify_credentials";
    pub const SETTINGS: &str = "account/settings";
    pub const UPDATE_PROFILE: &str = "account/update_profile";
}

pub mod service {
    pub const RATE_LIMIT_STATUS: &str = "application/rate_limit_status";
    pub const CONFIG: &str = "help/configuration";
}

pub mod media {
    pub const UPLOAD: &str = "media/upload";
    pub const METADATA: &str = "media/metadata/create";
}

/// Returns whether a POST to the given path carries a JSON body.
pub fn uses_json_body(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    let path = path.strip_suffix(".json").unwrap_or(path);
    JSON_BODY_ENDPOINTS.contains(&path)
}

/// Turns an endpoint path into a full URL against the given base.
///
/// Paths are given as `resource/action`, and get `.json` appended if they don't already carry it.
/// Absolute `http(s)` URLs are returned unchanged.
pub fn resolve(base: &str, path: &str) -> Result<String> {
    if path.starts_with("https://") || path.starts_with("http://") {
        return Ok(Url::parse(path)?.to_string());
    }

    let path = path.trim_start_matches('/');
    let path = if path.ends_with(".json") {
        path.to_string()
    } else {
        format!("{}.json", path)
    };

    let base = if base.ends_with('/') {
        Url::parse(base)?
    } else {
        Url::parse(&format!("{}/", base))?
    };

    Ok(base.join(&path)?.to_string())
}

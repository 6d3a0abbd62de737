// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Structs and functions for working with statuses and timelines.
//!
//! In this module, you can find the calls to post, load and interact with tweets. This also
//! includes loading a user's timeline, and liking or retweeting another tweet. However, this does
//! *not* include searching for tweets; that functionality is in the [`search`][] module.
//!
//! [`search`]: ../search/index.html
//!
//! ## Types
//!
//! - `Statuses`: posting, deleting, retweeting and loading tweets, plus the timelines. Reached
//!   through `Twitter::statuses`.
//! - `Favorites`: liking and unliking tweets, and the list of a user's likes. Reached through
//!   `Twitter::favorites`.
//!
//! ## Functions
//!
//! ### User actions
//!
//! These functions perform actions on their given tweets. They require write access to the
//! authenticated user's account, and fail with a `Domain` error when the client only holds a
//! bearer token.
//!
//! - `Statuses::update`/`Statuses::destroy`
//! - `Statuses::retweet`/`Statuses::unretweet`
//! - `Favorites::create`/`Favorites::destroy`
//!
//! ### Metadata lookup
//!
//! - `Statuses::show`
//! - `Statuses::lookup`
//! - `Statuses::retweets`/`Statuses::retweeters`
//!
//! ### Timelines
//!
//! These correspond to a user's own view of Twitter, or to feeds you might see attached to a
//! user's profile page. Page through them with the `since_id` and `max_id` options.
//!
//! - `Statuses::home_timeline`/`Statuses::mentions_timeline`/`Statuses::retweets_of_me`
//! - `Statuses::user_timeline`/`Favorites::list`

use crate::error::{Error, Result};

mod fun;

pub use self::fun::*;

/// The most tweets `Statuses::lookup` loads in one call.
pub const MAX_LOOKUP: usize = 100;

/// Checks that the given text can be posted as a tweet: it must not be empty, and must be at most
/// `max_len` characters long.
///
/// Length is counted in Unicode scalar values, so an emoji or an accented letter counts as one
/// character no matter how many bytes it takes.
pub fn validate_status_text(text: &str, max_len: usize) -> Result<()> {
    if text.is_empty() {
        return Err(Error::InvalidArgument("status text is empty".to_string()));
    }

    let len = text.chars().count();
    if len > max_len {
        return Err(Error::InvalidArgument(format!(
            "status text is {} characters long, the limit is {}",
            len, max_len
        )));
    }

    Ok(())
}

/// Joins the given tweet IDs into the comma-separated list `statuses/lookup` expects.
fn id_list<I: IntoIterator<Item = u64>>(ids: I) -> Result<String> {
    let ids = ids.into_iter().map(|id| id.to_string()).collect::<Vec<_>>();

    if ids.is_empty() {
        return Err(Error::InvalidArgument("no tweet IDs given for lookup".to_string()));
    }
    if ids.len() > MAX_LOOKUP {
        return Err(Error::InvalidArgument(format!(
            "{} tweet IDs given for lookup, the most Twitter accepts is {}",
            ids.len(),
            MAX_LOOKUP
        )));
    }

    Ok(ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_length_boundary() {
        let at_cap = "a".repeat(280);
        let over_cap = "a".repeat(281);
        assert!(validate_status_text(&at_cap, 280).is_ok());
        assert!(matches!(
            validate_status_text(&over_cap, 280),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(validate_status_text("", 280), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn status_length_counts_characters() {
        // four bytes each, one character each
        let emoji = "🦀".repeat(280);
        assert_eq!(emoji.len(), 1120);
        assert!(validate_status_text(&emoji, 280).is_ok());

        let accented = "é".repeat(141);
        assert!(validate_status_text(&accented, 140).is_err());
        assert!(validate_status_text(&accented, 141).is_ok());
    }

    #[test]
    fn lookup_ids() {
        assert_eq!(id_list(vec![20, 432656548536401920]).unwrap(), "20,432656548536401920");
        assert_eq!(id_list(1..=100).unwrap().split(',').count(), 100);
        assert!(id_list(1..=101).is_err());
        assert!(id_list(Vec::new()).is_err());
    }
}

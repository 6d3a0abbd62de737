// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Structs and methods for pulling user information from Twitter.
//!
//! Everything in here acts on users in some way, whether looking up user information, finding the
//! relations between two users, or actions like following a user.
//!
//! ## Types
//!
//! - `UserID`: used as a generic input to many functions, this enum allows you to refer to a user
//!   by a numeric ID or by their screen name.
//! - `Users`, `Friendships`, `Relations`: the endpoint groups, reached through
//!   `Twitter::users`, `Twitter::friendships`, `Twitter::followers` and `Twitter::friends`.
//!
//! ## Functions
//!
//! ### User actions
//!
//! These functions perform actions to the user's account. Their use requires that your application
//! request write access to authenticated accounts.
//!
//! - `Friendships::create`/`Friendships::destroy`
//!
//! ### Direct lookup
//!
//! - `Users::show`
//! - `Users::lookup`
//! - `Friendships::show`/`Friendships::lookup`
//!
//! ### Cursored lookup
//!
//! These calls return a page at a time; hand the `next_cursor` from one response back in the
//! `cursor` option to load the next page.
//!
//! - `Users::search`
//! - `Relations::ids`/`Relations::list`, for both followers and friends

use std::borrow::Cow;
use std::convert::TryFrom;

use regex::Regex;
use serde_json::Value;

use crate::common::*;
use crate::error::{Error, Result};

mod fun;

pub use self::fun::*;

/// The most identifiers a single batch lookup accepts.
pub const MAX_BATCH: usize = 100;

/// The longest screen name Twitter hands out.
pub const MAX_SCREEN_NAME_LENGTH: usize = 15;

/// Convenience enum to generalize between referring to an account by numeric ID or by screen name.
///
/// Many API calls ask for a user either by either screen name (e.g. `rustlang`) or by a numeric ID
/// assigned to the account (e.g. `165262228`). Calls in this library are abstracted around this
/// enum, and can take any type that converts into it:
///
/// * `u64`, `&u64`
/// * `&str`, `String`, `&String`
///
/// Strings that consist only of digits are taken to be numeric IDs; any other string is a screen
/// name. Screen names are checked when the call is made, so a malformed one shows up as an
/// `InvalidArgument` error from the call rather than a rejection from Twitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserID {
    /// Referring via the account's numeric ID.
    ID(u64),
    /// Referring via the account's screen name.
    ScreenName(CowStr),
}

impl UserID {
    /// Interprets a loosely-typed value as a user reference.
    ///
    /// Non-negative integers and numeric strings become IDs; other strings become screen names.
    pub fn from_value(value: &Value) -> Result<UserID> {
        match value {
            Value::Number(n) => n.as_u64().map(UserID::ID).ok_or_else(|| {
                Error::InvalidArgument(format!("{} is not a valid user ID", n))
            }),
            Value::String(s) => Ok(UserID::from(s.as_str())),
            other => Err(Error::InvalidArgument(format!(
                "{} can't be used to refer to a user",
                other
            ))),
        }
    }

    /// Returns the parameter name and value Twitter expects for this user.
    pub fn into_param(self) -> Result<(&'static str, CowStr)> {
        match self {
            UserID::ID(id) => Ok(("user_id", id.to_string().into())),
            UserID::ScreenName(name) => {
                validate_screen_name(&name)?;
                Ok(("screen_name", name))
            }
        }
    }

    /// Returns the parameter for this user with the given prefix, as in `source_id` or
    /// `target_screen_name`.
    pub(crate) fn into_prefixed_param(self, prefix: &str) -> Result<(String, CowStr)> {
        match self {
            UserID::ID(id) => Ok((format!("{}_id", prefix), id.to_string().into())),
            UserID::ScreenName(name) => {
                validate_screen_name(&name)?;
                Ok((format!("{}_screen_name", prefix), name))
            }
        }
    }
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl From<u64> for UserID {
    fn from(id: u64) -> UserID {
        UserID::ID(id)
    }
}

impl<'a> From<&'a u64> for UserID {
    fn from(id: &'a u64) -> UserID {
        UserID::ID(*id)
    }
}

impl<'a> From<&'a str> for UserID {
    fn from(name: &'a str) -> UserID {
        match name.parse::<u64>() {
            Ok(id) if is_numeric_id(name) => UserID::ID(id),
            _ => UserID::ScreenName(Cow::Owned(name.to_string())),
        }
    }
}

impl From<String> for UserID {
    fn from(name: String) -> UserID {
        match name.parse::<u64>() {
            Ok(id) if is_numeric_id(&name) => UserID::ID(id),
            _ => UserID::ScreenName(name.into()),
        }
    }
}

impl<'a> From<&'a String> for UserID {
    fn from(name: &'a String) -> UserID {
        UserID::from(name.as_str())
    }
}

impl<'a> From<&'a UserID> for UserID {
    fn from(id: &'a UserID) -> UserID {
        id.clone()
    }
}

impl TryFrom<i64> for UserID {
    type Error = Error;

    fn try_from(id: i64) -> Result<UserID> {
        u64::try_from(id)
            .map(UserID::ID)
            .map_err(|_| Error::InvalidArgument(format!("{} is not a valid user ID", id)))
    }
}

/// Checks that the given name is one Twitter could have handed out: 1 to 15 ASCII letters,
/// digits or underscores.
pub fn validate_screen_name(name: &str) -> Result<()> {
    lazy_static::lazy_static! {
        static ref SCREEN_NAME: Regex = Regex::new(r"^[A-Za-z0-9_]{1,15}$").unwrap();
    }

    if SCREEN_NAME.is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "{:?} is not a valid screen name (1-{} letters, digits or underscores)",
            name, MAX_SCREEN_NAME_LENGTH
        )))
    }
}

/// Collapses a batch of users into the single parameter Twitter's lookup endpoints expect.
///
/// The batch must hold between 1 and 100 users, all referred to the same way: either all by ID
/// (giving a comma-separated `user_id`) or all by screen name (giving a comma-separated
/// `screen_name`).
pub fn batch_param<T, I>(accts: I) -> Result<(&'static str, String)>
where
    T: Into<UserID>,
    I: IntoIterator<Item = T>,
{
    let mut ids = Vec::new();
    let mut names = Vec::new();

    for acct in accts {
        match acct.into() {
            UserID::ID(id) => ids.push(id.to_string()),
            UserID::ScreenName(name) => {
                validate_screen_name(&name)?;
                names.push(name.into_owned());
            }
        }
    }

    let count = ids.len() + names.len();
    if count == 0 {
        return Err(Error::InvalidArgument("no users given for lookup".to_string()));
    }
    if count > MAX_BATCH {
        return Err(Error::InvalidArgument(format!(
            "{} users given for lookup, the most Twitter accepts is {}",
            count, MAX_BATCH
        )));
    }

    match (ids.is_empty(), names.is_empty()) {
        (false, true) => Ok(("user_id", ids.join(","))),
        (true, false) => Ok(("screen_name", names.join(","))),
        _ => Err(Error::InvalidArgument(
            "a lookup batch can't mix user IDs and screen names".to_string(),
        )),
    }
}

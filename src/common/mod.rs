// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Set of structs and methods that act as a sort of internal prelude.
//!
//! The elements available in this module and its children are fairly basic building blocks that
//! the other modules all glob-import to make available as a common language.
//!
//! # Module contents
//!
//! ## `ParamList`
//!
//! `ParamList` is the collection of parameters to a given web call. It's consumed in the auth
//! module to both encode the request and compute the OAuth signature, and provides some easy
//! wrappers to consistently handle some types. `add_user_param` puts a `UserID` in as either a
//! `user_id` or a `screen_name` parameter, after checking that the screen name is one Twitter
//! would accept.
//!
//! ## `percent_encode`
//!
//! Twitter has its own idea of which bytes need escaping. Every query string, form body and OAuth
//! header value goes through this function.
//!
//! ## `Response`
//!
//! In its own module, `Response` is the wrapper every web call returns: the decoded JSON body, the
//! raw text, and the rate-limit information from the headers. The module also has `RateLimit`.

use std::borrow::Cow;
use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, PercentEncode};

mod response;

pub use crate::common::response::*;
use crate::error::Result;
use crate::user;

pub type CowStr = Cow<'static, str>;

/// Represents a list of parameters to a Twitter API call.
///
/// This type is a wrapper around a `BTreeMap<Cow<'static, str>, Cow<'static, str>>` to collect a
/// set of parameter key/value pairs. These are then used to assemble and sign a Twitter API
/// request. The map is ordered so that encoded bodies and query strings come out the same way
/// every time.
///
/// Most of the functions to add parameters follow a builder pattern, so that you can assemble a
/// `ParamList` in a single statement:
///
/// ```
/// use fledgling::ParamList;
///
/// let params = ParamList::new()
///     .add_param("command", "STATUS")
///     .add_param("media_id", "710511363345354753");
/// assert_eq!(params.to_urlencoded(), "command=STATUS&media_id=710511363345354753");
/// ```
#[derive(Debug, Clone, Default, PartialEq, derive_more::Deref, derive_more::DerefMut, derive_more::From)]
pub struct ParamList(BTreeMap<CowStr, CowStr>);

impl ParamList {
    /// Creates a new, empty `ParamList`.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds the given key/value parameter to this `ParamList`.
    pub fn add_param(mut self, key: impl Into<CowStr>, value: impl Into<CowStr>) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    /// Adds the given key/value parameter to this `ParamList` only if the given value is `Some`.
    pub fn add_opt_param(self, key: impl Into<CowStr>, value: Option<impl Into<CowStr>>) -> Self {
        match value {
            Some(val) => self.add_param(key.into(), val.into()),
            None => self,
        }
    }

    /// Adds the given key/value to this `ParamList` by mutating it in place, rather than consuming
    /// it as in `add_param`.
    pub fn add_param_ref(&mut self, key: impl Into<CowStr>, value: impl Into<CowStr>) {
        self.0.insert(key.into(), value.into());
    }

    /// Adds the given `UserID` as a parameter to this `ParamList` by adding either a `user_id` or
    /// `screen_name` parameter as appropriate.
    ///
    /// Screen names are checked against Twitter's rules first; a name that can't exist is an
    /// `InvalidArgument` error.
    pub fn add_user_param(self, id: user::UserID) -> Result<Self> {
        let (key, value) = id.into_param()?;
        Ok(self.add_param(key, value))
    }

    /// Merge the parameters from the given `ParamList` into this one.
    pub fn combine(&mut self, other: ParamList) {
        self.0.extend(other.0);
    }

    /// Renders this `ParamList` as an `application/x-www-form-urlencoded` string.
    ///
    /// The key/value pairs are printed as `key1=value1&key2=value2`, with all keys and values
    /// being percent-encoded according to Twitter's requirements.
    pub fn to_urlencoded(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Percent-encodes the given string based on the Twitter API specification.
///
/// Twitter bases its encoding scheme on RFC 3986, Section 2.1. Every *byte* that is not an ASCII
/// number or letter, or the ASCII characters `-`, `.`, `_`, or `~` must be replaced with a percent
/// sign (`%`) and the byte value in hexadecimal.
pub fn percent_encode(src: &str) -> PercentEncode {
    lazy_static::lazy_static! {
        static ref ENCODER: AsciiSet = percent_encoding::NON_ALPHANUMERIC
            .remove(b'-')
            .remove(b'.')
            .remove(b'_')
            .remove(b'~');
    }
    utf8_percent_encode(src, &*ENCODER)
}

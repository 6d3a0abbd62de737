// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Structs and methods for searching for tweets.
//!
//! To search, call `Search::tweets` (through `Twitter::search`) with your query and any options.
//! A full reference of the query syntax and of the options is available in [Twitter's Search API
//! documentation][search-doc].
//!
//! ```rust,no_run
//! # async fn doc(twitter: &fledgling::Twitter) -> fledgling::error::Result<()> {
//! use fledgling::Options;
//! use fledgling::search::{Distance, Geocode, ResultType};
//!
//! let near_dublin = Geocode::new(53.32, -6.38, Distance::Miles(1.0))?;
//! let opts = Options::new()
//!     .set("result_type", ResultType::Recent.to_string())
//!     .set("geocode", near_dublin)
//!     .set("count", 50);
//! let results = twitter.search().tweets("rustlang", Some(&opts)).await?;
//!
//! for tweet in results.get("statuses").and_then(|s| s.as_array()).into_iter().flatten() {
//!     println!("{}", tweet["text"]);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Results come back newest first. To page backwards, pass the smallest ID you've seen (minus
//! one) as the `max_id` option; to check for newer tweets, pass the largest as `since_id`.
//!
//! The `geocode` option can also be given as a string, `"latitude,longitude,radius"` with the
//! radius in `mi` or `km`. It is checked before the search is sent.
//!
//! [search-doc]: https://developer.twitter.com/en/docs/tweets/search/api-reference/get-search-tweets

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::client::Twitter;
use crate::common::*;
use crate::error::{Error, Result};
use crate::links;
use crate::options::{self, Kind, Options, Rules};

const TWEETS_RULES: Rules = &[
    ("geocode", Kind::Geocode),
    ("lang", Kind::Str),
    ("locale", Kind::Str),
    ("result_type", Kind::Str),
    ("count", Kind::Int),
    ("until", Kind::Str),
    ("since_id", Kind::Int),
    ("max_id", Kind::Int),
    ("include_entities", Kind::Bool),
    ("tweet_mode", Kind::Str),
];

/// Represents what kind of tweets should be included in search results.
#[derive(Debug, Copy, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ResultType {
    /// Return only the most recent tweets in the response.
    #[display(fmt = "recent")]
    Recent,
    /// Return only the most popular tweets in the response.
    #[display(fmt = "popular")]
    Popular,
    /// Include both popular and real-time results in the response.
    #[display(fmt = "mixed")]
    Mixed,
}

/// Represents a radius around a given location to return search results for.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Distance {
    /// A radius given in miles.
    Miles(f64),
    /// A radius given in kilometers.
    Kilometers(f64),
}

impl Distance {
    fn amount(&self) -> f64 {
        match *self {
            Distance::Miles(r) | Distance::Kilometers(r) => r,
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            Distance::Miles(_) => "mi",
            Distance::Kilometers(_) => "km",
        }
    }
}

/// A circular search area: tweets from users located within `radius` of the given point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geocode {
    latitude: f64,
    longitude: f64,
    radius: Distance,
}

impl Geocode {
    /// Creates a search area, checking that the point is on the globe and the radius is positive.
    pub fn new(latitude: f64, longitude: f64, radius: Distance) -> Result<Geocode> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidArgument(format!(
                "latitude {} is outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidArgument(format!(
                "longitude {} is outside [-180, 180]",
                longitude
            )));
        }
        let amount = radius.amount();
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "search radius must be positive, not {}",
                amount
            )));
        }

        Ok(Geocode {
            latitude,
            longitude,
            radius,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn radius(&self) -> Distance {
        self.radius
    }
}

/// Parses `"latitude,longitude,radius"`, with the radius suffixed by `mi` or `km`.
impl FromStr for Geocode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Geocode> {
        let bad = |why: &str| Error::InvalidArgument(format!("bad geocode {:?}: {}", s, why));

        let parts = s.split(',').map(str::trim).collect::<Vec<_>>();
        let (lat, long, radius) = match parts.as_slice() {
            [lat, long, radius] => (*lat, *long, *radius),
            _ => return Err(bad("expected latitude,longitude,radius")),
        };

        let number = |part: &str, what: &str| {
            part.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| bad(&format!("{} is not a number", what)))
        };
        let lat = number(lat, "latitude")?;
        let long = number(long, "longitude")?;

        let radius = if let Some(amount) = radius.strip_suffix("mi") {
            Distance::Miles(number(amount, "radius")?)
        } else if let Some(amount) = radius.strip_suffix("km") {
            Distance::Kilometers(number(amount, "radius")?)
        } else {
            return Err(bad("radius needs a unit, mi or km"));
        };

        Geocode::new(lat, long, radius)
    }
}

impl fmt::Display for Geocode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{},{},{}{}",
            self.latitude,
            self.longitude,
            self.radius.amount(),
            self.radius.unit()
        )
    }
}

impl From<Geocode> for Value {
    fn from(geocode: Geocode) -> Value {
        Value::String(geocode.to_string())
    }
}

/// Calls for searching tweets.
pub struct Search<'a> {
    client: &'a Twitter,
}

impl<'a> Search<'a> {
    pub(crate) fn new(client: &'a Twitter) -> Self {
        Search { client }
    }

    /// Search recent tweets for the given query.
    pub async fn tweets(&self, query: &str, opts: Option<&Options>) -> Result<Response> {
        if query.trim().is_empty() {
            return Err(Error::InvalidArgument("search query is empty".to_string()));
        }
        let params = options::filter(opts, TWEETS_RULES)?.add_param("q", query.to_string());
        self.client.get_params(links::search::TWEETS, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::user_config;
    use crate::transport::mock::MockTransport;
    use hyper::StatusCode;

    #[test]
    fn geocode_accepted() {
        let geo: Geocode = "53.32,-6.38,1mi".parse().unwrap();
        assert_eq!(geo.to_string(), "53.32,-6.38,1mi");
        assert_eq!(geo.radius(), Distance::Miles(1.0));

        let geo: Geocode = "37.781157, -122.398720, 2.5km".parse().unwrap();
        assert_eq!(geo.to_string(), "37.781157,-122.39872,2.5km");

        let geo: Geocode = "90,180,10mi".parse().unwrap();
        assert_eq!(geo.latitude(), 90.0);
        assert_eq!(geo.longitude(), 180.0);
    }

    #[test]
    fn geocode_rejected() {
        for bad in &[
            "53.32,-6.38",
            "53.32,-6.38,1",
            "53.32,-6.38,mi",
            "53.32,-6.38,1ft",
            "53.32,-6.38,1mi,extra",
            "north,-6.38,1mi",
            "90.5,0,1mi",
            "-91,0,1mi",
            "0,180.1,1km",
            "0,0,0km",
            "0,0,-3mi",
            "NaN,0,1mi",
            "",
        ] {
            let res = bad.parse::<Geocode>();
            assert!(
                matches!(res, Err(Error::InvalidArgument(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn result_types() {
        assert_eq!(ResultType::Recent.to_string(), "recent");
        assert_eq!(ResultType::Popular.to_string(), "popular");
        assert_eq!(ResultType::Mixed.to_string(), "mixed");
    }

    #[tokio::test]
    async fn search_tweets() {
        let transport = MockTransport::new();
        transport.respond(
            StatusCode::OK,
            r#"{"statuses":[],"search_metadata":{"count":15,"query":"rustlang"}}"#,
        );
        let twitter = Twitter::with_transport(user_config(), transport.clone());

        let opts = Options::new()
            .set("geocode", Geocode::new(53.320, -6.38, Distance::Miles(1.0)).unwrap())
            .set("result_type", ResultType::Mixed.to_string())
            .set("page", 2);
        let resp = twitter.search().tweets("#rustlang", Some(&opts)).await.unwrap();
        assert_eq!(resp.get("statuses"), Some(&serde_json::json!([])));

        let sent = transport.sent();
        assert_eq!(
            sent[0].uri,
            "https://api.twitter.com/1.1/search/tweets.json?geocode=53.32%2C-6.38%2C1mi&q=%23rustlang&result_type=mixed"
        );
    }

    #[tokio::test]
    async fn bad_geocode_not_sent() {
        let transport = MockTransport::new();
        let twitter = Twitter::with_transport(user_config(), transport.clone());

        let opts = Options::new().set("geocode", "53.32,-6.38");
        let err = twitter.search().tweets("rust", Some(&opts)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(transport.sent().is_empty());
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Optional parameters to API calls, and the rules each endpoint applies to them.
//!
//! Most Twitter endpoints take a handful of optional parameters on top of the ones they require.
//! Rather than a builder per endpoint, calls take an [`Options`] map of loosely-typed values:
//!
//! ```
//! use fledgling::Options;
//!
//! let opts = Options::new()
//!     .set("count", "50")
//!     .set("trim_user", "t")
//!     .set("not_a_real_option", true);
//! ```
//!
//! Each endpoint has a fixed list of the options it understands and the kind of value each one
//! holds. Options that aren't on the list are dropped without complaint. Listed ones are coerced
//! to what Twitter expects: integers may be given as numbers or numeric strings, and booleans are
//! `true` only for `true`, `"true"`, `"t"`, `1` and `"1"`. A value that can't be coerced is an
//! `InvalidArgument` error.
//!
//! [`Options`]: struct.Options.html

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::*;
use crate::error::{Error, Result};
use crate::search::Geocode;

/// A set of optional parameters to hand to an API call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options(BTreeMap<String, Value>);

impl Options {
    /// Creates an empty set of options.
    pub fn new() -> Options {
        Options(BTreeMap::new())
    }

    /// Sets the given option, replacing any previous value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Options {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns the value given for the named option.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Turns every option into a request parameter, without any per-endpoint filtering.
    ///
    /// Strings pass through, numbers and booleans are printed, and arrays of scalars are joined
    /// with commas. `null` options are skipped. Nested objects can't be form-encoded and are an
    /// `InvalidArgument` error.
    pub(crate) fn to_params(&self) -> Result<ParamList> {
        let mut params = ParamList::new();
        for (name, value) in &self.0 {
            if value.is_null() {
                continue;
            }
            let rendered = match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| scalar(name, item))
                    .collect::<Result<Vec<_>>>()?
                    .join(","),
                other => scalar(name, other)?,
            };
            params.add_param_ref(name.clone(), rendered);
        }
        Ok(params)
    }

    /// The options as a JSON object.
    pub(crate) fn to_json(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for Options {
    fn from(map: BTreeMap<String, Value>) -> Options {
        Options(map)
    }
}

/// What kind of value an option holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    /// An integer, given as a number or a numeric string.
    Int,
    /// A floating-point number, given as a number or a numeric string.
    Float,
    /// A flag. Only the truthy set counts as `true`.
    Bool,
    /// Free text.
    Str,
    /// A comma-separated list of numeric IDs, given as an array or a string.
    IdList,
    /// A `latitude,longitude,radius` search area.
    Geocode,
}

/// The options an endpoint accepts.
pub(crate) type Rules = &'static [(&'static str, Kind)];

/// Keeps the options listed in `rules`, coerced to their kind, and drops everything else.
pub(crate) fn filter(options: Option<&Options>, rules: Rules) -> Result<ParamList> {
    let mut params = ParamList::new();
    let options = match options {
        Some(options) => options,
        None => return Ok(params),
    };

    for (name, value) in options.iter() {
        let kind = match rules.iter().find(|(rule, _)| rule == name) {
            Some((_, kind)) => *kind,
            None => {
                log::debug!("dropping unsupported option {:?}", name);
                continue;
            }
        };
        if value.is_null() {
            continue;
        }

        let rendered = match kind {
            Kind::Int => coerce_int(name, value)?,
            Kind::Float => coerce_float(name, value)?,
            Kind::Bool => is_truthy(value).to_string(),
            Kind::Str => scalar(name, value)?,
            Kind::IdList => coerce_id_list(name, value)?,
            Kind::Geocode => match value {
                Value::String(s) => s.parse::<Geocode>()?.to_string(),
                _ => return Err(invalid(name, value)),
            },
        };
        params.add_param_ref(name.clone(), rendered);
    }

    Ok(params)
}

/// Returns whether the given value is one of `true`, `"true"`, `"t"`, `1` or `"1"`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.as_str(), "true" | "t" | "1"),
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

fn invalid(name: &str, value: &Value) -> Error {
    Error::InvalidArgument(format!("unusable value for option {:?}: {}", name, value))
}

fn scalar(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(invalid(name, value)),
    }
}

pub(crate) fn coerce_int(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Ok(u.to_string())
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok((f as i64).to_string()),
                    _ => Err(invalid(name, value)),
                }
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Ok(i.to_string())
            } else if let Ok(u) = s.parse::<u64>() {
                Ok(u.to_string())
            } else {
                Err(invalid(name, value))
            }
        }
        _ => Err(invalid(name, value)),
    }
}

fn coerce_float(name: &str, value: &Value) -> Result<String> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => Ok(f.to_string()),
        _ => Err(invalid(name, value)),
    }
}

fn coerce_id_list(name: &str, value: &Value) -> Result<String> {
    let ids = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| coerce_int(name, item))
            .collect::<Result<Vec<_>>>()?,
        Value::String(s) => s
            .split(',')
            .map(|item| coerce_int(name, &Value::String(item.to_string())))
            .collect::<Result<Vec<_>>>()?,
        Value::Number(_) => vec![coerce_int(name, value)?],
        _ => return Err(invalid(name, value)),
    };

    if ids.is_empty() {
        return Err(invalid(name, value));
    }

    Ok(ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RULES: Rules = &[
        ("count", Kind::Int),
        ("trim_user", Kind::Bool),
        ("lang", Kind::Str),
        ("lat", Kind::Float),
        ("media_ids", Kind::IdList),
        ("geocode", Kind::Geocode),
    ];

    fn param(params: &ParamList, name: &str) -> Option<String> {
        params.get(name).map(|v| v.to_string())
    }

    #[test]
    fn truthy_set() {
        for yes in &[json!(true), json!("true"), json!("t"), json!(1), json!("1")] {
            assert!(is_truthy(yes), "{} should be truthy", yes);
        }
        for no in &[
            json!(false),
            json!("false"),
            json!("yes"),
            json!("True"),
            json!(0),
            json!(2),
            json!(null),
            json!([1]),
        ] {
            assert!(!is_truthy(no), "{} should not be truthy", no);
        }
    }

    #[test]
    fn unknown_options_dropped() {
        let opts = Options::new()
            .set("count", "25")
            .set("trim_user", "t")
            .set("include_everything", true)
            .set("lang", "en");

        let params = filter(Some(&opts), RULES).unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(param(&params, "count").as_deref(), Some("25"));
        assert_eq!(param(&params, "trim_user").as_deref(), Some("true"));
        assert_eq!(param(&params, "lang").as_deref(), Some("en"));
        assert!(params.get("include_everything").is_none());

        assert!(filter(None, RULES).unwrap().is_empty());
    }

    #[test]
    fn coercion() {
        let opts = Options::new()
            .set("count", " 007 ")
            .set("trim_user", 0)
            .set("lat", "37.7821120598956")
            .set("media_ids", vec![471592142565957632u64, 471592142565957633u64]);
        let params = filter(Some(&opts), RULES).unwrap();
        assert_eq!(param(&params, "count").as_deref(), Some("7"));
        assert_eq!(param(&params, "trim_user").as_deref(), Some("false"));
        assert_eq!(param(&params, "lat").as_deref(), Some("37.7821120598956"));
        assert_eq!(
            param(&params, "media_ids").as_deref(),
            Some("471592142565957632,471592142565957633")
        );

        let opts = Options::new().set("media_ids", "1, 2,3");
        let params = filter(Some(&opts), RULES).unwrap();
        assert_eq!(param(&params, "media_ids").as_deref(), Some("1,2,3"));

        let opts = Options::new().set("count", 20.0);
        let params = filter(Some(&opts), RULES).unwrap();
        assert_eq!(param(&params, "count").as_deref(), Some("20"));
    }

    #[test]
    fn bad_values() {
        for opts in vec![
            Options::new().set("count", "twenty"),
            Options::new().set("count", 2.5),
            Options::new().set("lang", json!({"code": "en"})),
            Options::new().set("media_ids", "1,two"),
            Options::new().set("geocode", "53.32,-6.38"),
            Options::new().set("geocode", 12),
        ] {
            let err = filter(Some(&opts), RULES).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "{:?}", opts);
        }
    }

    #[test]
    fn geocode_normalized() {
        let opts = Options::new().set("geocode", "53.320,-6.38,1mi");
        let params = filter(Some(&opts), RULES).unwrap();
        assert_eq!(param(&params, "geocode").as_deref(), Some("53.32,-6.38,1mi"));
    }

    #[test]
    fn unfiltered_params() {
        let opts = Options::new()
            .set("status", "hi")
            .set("ids", vec![1, 2])
            .set("flag", false)
            .set("skip", Value::Null);
        let params = opts.to_params().unwrap();
        assert_eq!(params.to_urlencoded(), "flag=false&ids=1%2C2&status=hi");

        let nested = Options::new().set("event", json!({"type": "message_create"}));
        assert!(nested.to_params().is_err());
        assert_eq!(nested.to_json(), json!({"event": {"type": "message_create"}}));
    }
}

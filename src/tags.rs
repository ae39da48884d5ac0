//! Field tags: the per-field metadata that drives naming, examples and
//! required-ness during schema generation.
//!
//! Tags are written in the conventional `key:"value"` form, separated by
//! whitespace:
//!
//! ```
//! use swagdoc::tags::FieldTags;
//!
//! let tags: FieldTags = r#"json:"id,omitempty" example:"42" desc:"Product id""#.parse().unwrap();
//! assert_eq!(tags.json_name(), Some("id"));
//! assert!(tags.omitempty());
//! assert_eq!(tags.get("example"), Some("42"));
//! ```

use log::debug;
use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while1},
    character::complete::{anychar, char, multispace0, multispace1},
    combinator::{all_consuming, map},
    multi::{fold_many0, separated_list0},
    sequence::{delimited, preceded, separated_pair},
    IResult,
};
use std::str::FromStr;

use crate::error::{SwagError, SwagResult};

/// Marker used in a `json` tag to exclude a field from its schema
pub const SKIP_MARKER: &str = "-";

/// Ordered key/value tags attached to one struct field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTags {
    pairs: Vec<(String, String)>,
}

impl FieldTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a tag string such as `json:"name" example:"x"`
    pub fn parse(input: &str) -> SwagResult<Self> {
        let result: IResult<&str, Vec<(String, String)>> = all_consuming(delimited(
            multispace0,
            separated_list0(multispace1, tag_pair),
            multispace0,
        ))(input);

        match result {
            Ok((_, pairs)) => {
                debug!("Parsed {} field tag(s) from {:?}", pairs.len(), input);
                Ok(Self { pairs })
            }
            Err(e) => Err(SwagError::tag(format!("{:?}: {}", input, e))),
        }
    }

    /// Set a tag, replacing any previous value for the same key
    pub fn with(mut self, key: &str, value: &str) -> Self {
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value.to_string(),
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
        self
    }

    pub fn json(self, value: &str) -> Self {
        self.with("json", value)
    }

    pub fn example(self, value: &str) -> Self {
        self.with("example", value)
    }

    pub fn desc(self, value: &str) -> Self {
        self.with("desc", value)
    }

    pub fn required(self) -> Self {
        self.with("required", "true")
    }

    /// Value of a tag, `None` when the key is absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First segment of the `json` tag, if one was given and is non-empty
    pub fn json_name(&self) -> Option<&str> {
        self.get("json")
            .and_then(|v| v.split(',').next())
            .filter(|name| !name.is_empty())
    }

    /// `json:"-"` excludes the field; `json:"-,"` names it "-"
    pub fn is_skipped(&self) -> bool {
        self.get("json") == Some(SKIP_MARKER)
    }

    pub fn omitempty(&self) -> bool {
        self.get("json")
            .map(|v| v.split(',').skip(1).any(|opt| opt.trim() == "omitempty"))
            .unwrap_or(false)
    }

    /// Explicit `required:"true"`
    pub fn is_required(&self) -> bool {
        self.get("required")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn description(&self) -> Option<&str> {
        self.get("desc").filter(|d| !d.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromStr for FieldTags {
    type Err = SwagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_key_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_control() && c != ':' && c != '"'
}

fn tag_pair(input: &str) -> IResult<&str, (String, String)> {
    separated_pair(
        map(take_while1(is_key_char), String::from),
        char(':'),
        quoted,
    )(input)
}

fn quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        fold_many0(
            alt((
                map(is_not("\\\""), String::from),
                map(preceded(char('\\'), anychar), |c| match c {
                    'n' => "\n".to_string(),
                    't' => "\t".to_string(),
                    other => other.to_string(),
                }),
            )),
            String::new,
            |mut acc, piece| {
                acc.push_str(&piece);
                acc
            },
        ),
        char('"'),
    )(input)
}

//! OpenAPI 3 runtime expressions, as used by links and callbacks.
//!
//! ```
//! use swagdoc::expression::{RuntimeExpression, Source};
//!
//! let expr: RuntimeExpression = "$request.body#/user/id".parse().unwrap();
//! assert_eq!(expr, RuntimeExpression::Request(Source::Body(Some("/user/id".into()))));
//! ```

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while, take_while1},
    character::complete::char,
    combinator::{all_consuming, map, opt, recognize, value},
    multi::{many0, many1},
    sequence::{delimited, pair, preceded},
    IResult,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Invalid runtime expression {expression:?}: {reason}")]
    Invalid { expression: String, reason: String },

    #[error("Invalid expression template {template:?}: {reason}")]
    Template { template: String, reason: String },

    #[error("Link must target exactly one of operationId or operationRef")]
    LinkTarget,

    #[error("Callback name must not be empty")]
    EmptyCallbackName,
}

/// Part of a request or response a runtime expression reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Header(String),
    Query(String),
    Path(String),
    /// Whole body, or the value at a JSON pointer inside it
    Body(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeExpression {
    Url,
    Method,
    StatusCode,
    Request(Source),
    Response(Source),
}

impl RuntimeExpression {
    pub fn parse(input: &str) -> Result<Self, ExpressionError> {
        all_consuming(expression)(input)
            .map(|(_, expr)| expr)
            .map_err(|e| ExpressionError::Invalid {
                expression: input.to_string(),
                reason: e.to_string(),
            })
    }
}

impl FromStr for RuntimeExpression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Header(name) => write!(f, "header.{}", name),
            Source::Query(name) => write!(f, "query.{}", name),
            Source::Path(name) => write!(f, "path.{}", name),
            Source::Body(None) => write!(f, "body"),
            Source::Body(Some(pointer)) => write!(f, "body#{}", pointer),
        }
    }
}

impl fmt::Display for RuntimeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeExpression::Url => write!(f, "$url"),
            RuntimeExpression::Method => write!(f, "$method"),
            RuntimeExpression::StatusCode => write!(f, "$statusCode"),
            RuntimeExpression::Request(source) => write!(f, "$request.{}", source),
            RuntimeExpression::Response(source) => write!(f, "$response.{}", source),
        }
    }
}

impl Serialize for RuntimeExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RuntimeExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_control() && c != '{' && c != '}'
}

fn expression(input: &str) -> IResult<&str, RuntimeExpression> {
    alt((
        value(RuntimeExpression::Url, tag("$url")),
        value(RuntimeExpression::Method, tag("$method")),
        value(RuntimeExpression::StatusCode, tag("$statusCode")),
        map(preceded(tag("$request."), source), RuntimeExpression::Request),
        map(preceded(tag("$response."), source), RuntimeExpression::Response),
    ))(input)
}

fn source(input: &str) -> IResult<&str, Source> {
    alt((
        map(preceded(tag("header."), take_while1(is_tchar)), |s: &str| {
            Source::Header(s.to_string())
        }),
        map(preceded(tag("query."), take_while1(is_name_char)), |s: &str| {
            Source::Query(s.to_string())
        }),
        map(preceded(tag("path."), take_while1(is_name_char)), |s: &str| {
            Source::Path(s.to_string())
        }),
        map(preceded(tag("body"), opt(preceded(char('#'), json_pointer))), |p| {
            Source::Body(p.map(str::to_string))
        }),
    ))(input)
}

/// RFC 6901 pointer; `~` must be followed by `0` or `1`
fn json_pointer(input: &str) -> IResult<&str, &str> {
    recognize(many0(preceded(
        char('/'),
        many0(alt((
            recognize(pair(char('~'), alt((char('0'), char('1'))))),
            take_while1(|c: char| c != '/' && c != '~' && c != '}' && !c.is_whitespace()),
        ))),
    )))(input)
}

/// Piece of a templated string such as a callback URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Expression(RuntimeExpression),
}

/// String with embedded `{$...}` runtime expressions, e.g.
/// `https://hooks.example.com?id={$request.body#/id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionTemplate {
    raw: String,
    parts: Vec<TemplatePart>,
}

impl ExpressionTemplate {
    pub fn parse(input: &str) -> Result<Self, ExpressionError> {
        let invalid = |reason: String| ExpressionError::Template {
            template: input.to_string(),
            reason,
        };

        let result: IResult<&str, Vec<(bool, &str)>> = all_consuming(many1(alt((
            map(is_not("{}"), |s: &str| (false, s)),
            map(
                delimited(char('{'), take_while(|c: char| c != '{' && c != '}'), char('}')),
                |s: &str| (true, s),
            ),
        ))))(input);
        let (_, raw_parts) = result.map_err(|e| invalid(e.to_string()))?;

        let mut parts = Vec::with_capacity(raw_parts.len());
        for (is_expression, text) in raw_parts {
            if is_expression {
                let expr = RuntimeExpression::parse(text).map_err(|e| invalid(e.to_string()))?;
                parts.push(TemplatePart::Expression(expr));
            } else {
                parts.push(TemplatePart::Literal(text.to_string()));
            }
        }

        Ok(Self {
            raw: input.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    pub fn expressions(&self) -> impl Iterator<Item = &RuntimeExpression> {
        self.parts.iter().filter_map(|part| match part {
            TemplatePart::Expression(expr) => Some(expr),
            TemplatePart::Literal(_) => None,
        })
    }
}

impl fmt::Display for ExpressionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expressions() {
        assert_eq!(RuntimeExpression::parse("$url").unwrap(), RuntimeExpression::Url);
        assert_eq!(RuntimeExpression::parse("$statusCode").unwrap(), RuntimeExpression::StatusCode);
        assert_eq!(
            RuntimeExpression::parse("$request.header.X-Request-ID").unwrap(),
            RuntimeExpression::Request(Source::Header("X-Request-ID".into()))
        );
        assert_eq!(
            RuntimeExpression::parse("$request.path.id").unwrap(),
            RuntimeExpression::Request(Source::Path("id".into()))
        );
        assert_eq!(
            RuntimeExpression::parse("$response.body").unwrap(),
            RuntimeExpression::Response(Source::Body(None))
        );
        assert_eq!(
            RuntimeExpression::parse("$response.body#/a~1b/0").unwrap(),
            RuntimeExpression::Response(Source::Body(Some("/a~1b/0".into())))
        );
    }

    #[test]
    fn test_display_round_trips_text() {
        for text in ["$method", "$request.query.limit", "$response.body#/id"] {
            assert_eq!(RuntimeExpression::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_invalid_expressions() {
        for text in ["", "url", "$request", "$request.cookie.x", "$request.header.", "$response.body#/a~2", "$url "] {
            assert!(RuntimeExpression::parse(text).is_err(), "{:?} should not parse", text);
        }
    }

    #[test]
    fn test_template_with_expressions() {
        let template =
            ExpressionTemplate::parse("https://hooks.example.com/{$request.path.id}?event={$request.body#/event}")
                .unwrap();
        let exprs: Vec<String> = template.expressions().map(|e| e.to_string()).collect();
        assert_eq!(exprs, vec!["$request.path.id", "$request.body#/event"]);
        assert_eq!(template.parts().len(), 4);

        let bare = ExpressionTemplate::parse("{$request.body#/callbackUrl}").unwrap();
        assert_eq!(bare.parts().len(), 1);
    }

    #[test]
    fn test_invalid_templates() {
        assert!(ExpressionTemplate::parse("https://x/{$bogus}").is_err());
        assert!(ExpressionTemplate::parse("https://x/{$url").is_err());
        assert!(ExpressionTemplate::parse("").is_err());
    }
}

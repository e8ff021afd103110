//! Query input adapters.
//!
//! The compiler accepts a raw query string, an already parsed key/value
//! list, or anything exposing a request URL. All of them are normalized to
//! [`QueryParams`] before compilation.

use std::borrow::Cow;

use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::error::{CompileError, Result};

/// Base used to resolve relative request URLs such as `/users?$top=5`.
const BASE_URL: &str = "http://localhost/";

/// Ordered query-string parameters.
///
/// Keys may repeat; lookups return the last value, which is how query
/// strings like `$top=5&$top=10` are interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a percent-encoded query string. A leading `?` is ignored.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Appends a parameter, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Returns the last value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value of `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates all parameters in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Anything that carries a request URL, absolute or relative.
pub trait RequestLike {
    /// Returns the request URL.
    fn url(&self) -> &str;
}

impl RequestLike for Url {
    fn url(&self) -> &str {
        self.as_str()
    }
}

/// Query input accepted by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    /// Raw query string, with or without a leading `?`.
    Raw(String),
    /// Already parsed parameters.
    Params(QueryParams),
    /// Request URL whose query component is compiled.
    Url(String),
}

impl QueryInput {
    /// Wraps the URL of a request-like value.
    #[must_use]
    pub fn from_request<R: RequestLike + ?Sized>(request: &R) -> Self {
        Self::Url(String::from(request.url()))
    }

    /// Normalizes the input to query parameters.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::InvalidUrl` if a request URL cannot be parsed.
    pub fn to_params(&self) -> Result<Cow<'_, QueryParams>> {
        match self {
            Self::Raw(query) => Ok(Cow::Owned(QueryParams::parse(query))),
            Self::Params(params) => Ok(Cow::Borrowed(params)),
            Self::Url(raw) => {
                let url = Url::parse(BASE_URL)
                    .and_then(|base| base.join(raw))
                    .map_err(|source| CompileError::InvalidUrl {
                        url: raw.clone(),
                        source,
                    })?;
                Ok(Cow::Owned(url.query_pairs().into_owned().collect()))
            }
        }
    }
}

impl From<&str> for QueryInput {
    fn from(query: &str) -> Self {
        Self::Raw(String::from(query))
    }
}

impl From<String> for QueryInput {
    fn from(query: String) -> Self {
        Self::Raw(query)
    }
}

impl From<QueryParams> for QueryInput {
    fn from(params: QueryParams) -> Self {
        Self::Params(params)
    }
}

impl From<&Url> for QueryInput {
    fn from(url: &Url) -> Self {
        Self::from_request(url)
    }
}

impl TryFrom<&Value> for QueryInput {
    type Error = CompileError;

    /// Accepts a JSON string (raw query), an object with a string `url`
    /// field (request), or an object of scalar or scalar-array values
    /// (parameters).
    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(query) => Ok(Self::Raw(query.clone())),
            Value::Object(map) => {
                if let Some(Value::String(url)) = map.get("url") {
                    return Ok(Self::Url(url.clone()));
                }
                let mut params = QueryParams::new();
                for (key, value) in map {
                    match value {
                        Value::Array(items) => {
                            for item in items {
                                params.push(key.as_str(), scalar(key, item)?);
                            }
                        }
                        other => params.push(key.as_str(), scalar(key, other)?),
                    }
                }
                Ok(Self::Params(params))
            }
            other => Err(CompileError::UnsupportedInput(format!(
                "expected a query string, a parameter object or a request with a url, got {}",
                kind(other)
            ))),
        }
    }
}

fn scalar(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(CompileError::UnsupportedInput(format!(
            "parameter '{key}' must be a string, number or boolean, got {}",
            kind(other)
        ))),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

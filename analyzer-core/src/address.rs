use serde::{Deserialize, Serialize};
use std::fmt;
use url::{Position, Url};

/// Canonical origin of a page: lowercase `scheme://authority`, never a path,
/// query, or fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap a value previously produced by [`normalize`], e.g. one loaded
    /// back from storage. The string is taken as-is.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reduce `raw` to `scheme://authority`, lowercased.
///
/// Performs no validation: input the URL parser rejects becomes `"://"`, and
/// a URL without a host keeps only its scheme (`"mailto:x"` -> `"mailto://"`).
///
/// ```
/// use analyzer_core::normalize;
///
/// assert_eq!(normalize("HTTP://Example.COM/path?q=1").as_str(), "http://example.com");
/// assert_eq!(normalize("not a url").as_str(), "://");
/// ```
pub fn normalize(raw: &str) -> Address {
    let (scheme, authority) = match Url::parse(raw) {
        Ok(url) => (
            url.scheme().to_owned(),
            url[Position::BeforeUsername..Position::AfterPort].to_owned(),
        ),
        Err(_) => (String::new(), String::new()),
    };
    Address(format!("{scheme}://{authority}").to_lowercase())
}

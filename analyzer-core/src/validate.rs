use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::net::Ipv4Addr;
use thiserror::Error;
use url::{Host, Url};

/// Upper bound on the raw input length, in characters.
pub const MAX_URL_LENGTH: usize = 255;

const MALFORMED_MESSAGE: &str = "Некорректный URL";
const TOO_LONG_MESSAGE: &str = "URL превышает 255 символов";

const ALLOWED_SCHEMES: &[&str] = &[
    "http", "https", "ftp", "ftps", "sftp", "ssh", "git", "irc", "rtmp", "rtmps", "rtsp", "telnet",
];

/// Why a raw address was rejected. Each variant renders one fixed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{}", MALFORMED_MESSAGE)]
    Malformed,
    #[error("{}", TOO_LONG_MESSAGE)]
    TooLong,
}

impl ValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Malformed => MALFORMED_MESSAGE,
            Self::TooLong => TOO_LONG_MESSAGE,
        }
    }
}

/// Result of [`validate`]. Serializes as `{"valid": true}` or
/// `{"valid": false, "message": "..."}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(ValidationError),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e.message()),
        }
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(e) => Err(e),
        }
    }
}

impl Serialize for ValidationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.message() {
            None => {
                let mut s = serializer.serialize_struct("ValidationOutcome", 1)?;
                s.serialize_field("valid", &true)?;
                s.end()
            }
            Some(message) => {
                let mut s = serializer.serialize_struct("ValidationOutcome", 2)?;
                s.serialize_field("valid", &false)?;
                s.serialize_field("message", message)?;
                s.end()
            }
        }
    }
}

/// Check that `raw` is a well-formed address of at most [`MAX_URL_LENGTH`]
/// characters. Only the first problem found is reported; length is checked
/// only once the syntax is accepted.
///
/// ```
/// use analyzer_core::{validate, ValidationError, ValidationOutcome};
///
/// assert!(validate("https://example.com").is_valid());
/// assert_eq!(
///     validate("not a url"),
///     ValidationOutcome::Invalid(ValidationError::Malformed)
/// );
/// ```
pub fn validate(raw: &str) -> ValidationOutcome {
    if !is_well_formed(raw) {
        tracing::debug!(len = raw.len(), "validate.malformed");
        return ValidationOutcome::Invalid(ValidationError::Malformed);
    }
    if raw.chars().count() > MAX_URL_LENGTH {
        tracing::debug!(len = raw.chars().count(), "validate.too_long");
        return ValidationOutcome::Invalid(ValidationError::TooLong);
    }
    ValidationOutcome::Valid
}

fn is_well_formed(raw: &str) -> bool {
    // The URL parser strips surrounding whitespace and tabs; we don't.
    if raw.is_empty() || raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return false;
    }
    // Reject `http:example.com`, which the parser would otherwise repair.
    let Some(after_scheme) = raw
        .get(url.scheme().len()..)
        .and_then(|rest| rest.strip_prefix("://"))
    else {
        return false;
    };
    let Some(host) = typed_host(after_scheme) else {
        return false;
    };
    // The parser rewrites shorthand IPv4 (`12345`, `0x7f.1`) and decodes
    // percent-escapes, so judge the host as it was typed.
    match url.host() {
        Some(Host::Ipv4(_)) => host.parse::<Ipv4Addr>().is_ok(),
        Some(Host::Ipv6(_)) => host.starts_with('[') && host.ends_with(']'),
        Some(Host::Domain(_)) => {
            host.parse::<Ipv4Addr>().is_ok() || is_valid_domain(&host.to_lowercase())
        }
        None => false,
    }
}

/// Host portion of the text following `scheme://`: userinfo, port, path,
/// query and fragment removed. IPv6 literals keep their brackets.
fn typed_host(after_scheme: &str) -> Option<&str> {
    let end = after_scheme
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(after_scheme.len());
    let authority = &after_scheme[..end];
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = if host_port.starts_with('[') {
        &host_port[..host_port.find(']')? + 1]
    } else {
        host_port.split_once(':').map_or(host_port, |(h, _)| h)
    };
    (!host.is_empty()).then_some(host)
}

fn is_valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    let Some((tld, rest)) = labels.split_last() else {
        return false;
    };
    !rest.is_empty() && rest.iter().all(|l| is_valid_label(l)) && is_valid_tld(tld)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

fn is_valid_tld(tld: &str) -> bool {
    if let Some(puny) = tld.strip_prefix("xn--") {
        return !puny.is_empty() && puny.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    }
    tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic)
}

use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::gemini::parser::ParseError;

const SCHEME: &str = "gemini";

/// A request as received: the URL line, trimmed of its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    raw_url: String,
}

/// The parts of a request URL the server acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub host: String,
    pub port: Option<u16>,
    pub path: RequestPath,
}

/// Decoded URL path with the scheme and authority removed and at most one
/// trailing `/` dropped. The root is the empty path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath(String);

impl Request {
    pub fn new(raw_url: impl Into<String>) -> Self {
        let mut raw_url = raw_url.into();
        raw_url.truncate(raw_url.trim_end().len());
        Self { raw_url }
    }

    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    /// Parses the URL and derives the path to resolve.
    ///
    /// # Errors
    ///
    /// Anything that is not an absolute `gemini://host[/path]` URL without
    /// userinfo is rejected with the matching [`ParseError`].
    pub fn target(&self) -> Result<RequestTarget, ParseError> {
        let url = Url::parse(&self.raw_url).map_err(|_| ParseError::InvalidUrl)?;

        if url.scheme() != SCHEME {
            return Err(ParseError::UnsupportedScheme(url.scheme().to_string()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ParseError::UserInfo);
        }

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(ParseError::MissingHost),
        };

        let path = RequestPath::from_url_path(url.path())?;

        Ok(RequestTarget {
            host,
            port: url.port(),
            path,
        })
    }
}

impl RequestPath {
    /// Percent-decodes `path` and drops a single trailing `/`.
    pub fn from_url_path(path: &str) -> Result<Self, ParseError> {
        let decoded = percent_decode_str(path)
            .decode_utf8()
            .map_err(|_| ParseError::InvalidUtf8)?;

        let trimmed = decoded.strip_suffix('/').unwrap_or(&decoded);
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}

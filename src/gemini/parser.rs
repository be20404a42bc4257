use crate::gemini::request::Request;
use crate::gemini::response::Response;

/// Longest request URL the protocol allows, excluding the terminator.
pub const MAX_REQUEST_LINE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No terminator yet; read more bytes.
    Incomplete,
    /// The line exceeds [`MAX_REQUEST_LINE`] bytes.
    TooLong,
    InvalidUtf8,
    Empty,
    InvalidUrl,
    MissingHost,
    UserInfo,
    UnsupportedScheme(String),
    WrongHost(String),
    WrongPort(u16),
}

impl ParseError {
    /// Maps the error to the response the client should receive.
    pub fn response(&self) -> Response {
        match self {
            ParseError::Incomplete => Response::bad_request("Incomplete request"),
            ParseError::TooLong => Response::bad_request("Request exceeds 1024 bytes"),
            ParseError::InvalidUtf8 => Response::bad_request("Request is not valid UTF-8"),
            ParseError::Empty => Response::bad_request("Empty request"),
            ParseError::InvalidUrl => Response::bad_request("Invalid URL"),
            ParseError::MissingHost => Response::bad_request("URL has no host"),
            ParseError::UserInfo => Response::bad_request("URL must not contain userinfo"),
            ParseError::UnsupportedScheme(scheme) => {
                Response::proxy_request_refused(format!("Scheme {} is not served here", scheme))
            }
            ParseError::WrongHost(host) => {
                Response::proxy_request_refused(format!("Host {} is not served here", host))
            }
            ParseError::WrongPort(port) => {
                Response::proxy_request_refused(format!("Port {} is not served here", port))
            }
        }
    }
}

/// Extracts one request line from `buf`.
///
/// Accepts `\r\n` and a bare `\n` as terminator. On success returns the
/// request and the number of bytes consumed, terminator included.
pub fn parse_request_line(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let Some(newline) = buf.iter().position(|&b| b == b'\n') else {
        // URL + CRLF is the most a conforming client may send before the terminator.
        if buf.len() >= MAX_REQUEST_LINE + 2 {
            return Err(ParseError::TooLong);
        }
        return Err(ParseError::Incomplete);
    };

    let line = &buf[..newline];
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    if line.len() > MAX_REQUEST_LINE {
        return Err(ParseError::TooLong);
    }

    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidUtf8)?;
    let raw_url = line.trim();

    if raw_url.is_empty() {
        return Err(ParseError::Empty);
    }

    Ok((Request::new(raw_url), newline + 1))
}

use bytes::{BufMut, Bytes, BytesMut};

use crate::gemini::status::StatusCode;

/// Longest meta string a Gemini response header may carry.
pub const MAX_META_LEN: usize = 1024;

/// A complete Gemini response ready to be sent to a client.
///
/// The body is only ever non-empty for [`StatusCode::Success`]; every
/// constructor goes through [`ResponseBuilder::build`], which enforces this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    meta: String,
    body: Bytes,
}

/// Builder for constructing Gemini responses in a fluent style.
///
/// # Example
///
/// ```
/// # use capsule::gemini::response::ResponseBuilder;
/// # use capsule::gemini::status::StatusCode;
/// let response = ResponseBuilder::new(StatusCode::Success)
///     .meta("text/gemini")
///     .body(b"# Hello".to_vec())
///     .build();
/// assert_eq!(response.to_bytes().as_ref(), b"20 text/gemini\r\n# Hello");
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    meta: String,
    body: Bytes,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            meta: String::new(),
            body: Bytes::new(),
        }
    }

    /// Sets the meta string: MIME type, prompt, URL or message depending on
    /// the status category.
    pub fn meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = meta.into();
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the final Response.
    ///
    /// # Panics
    ///
    /// Attaching a non-empty body to anything but a success status is a
    /// programming error and panics.
    pub fn build(self) -> Response {
        assert!(
            self.body.is_empty() || self.status.allows_body(),
            "status {} cannot carry a body",
            self.status
        );

        Response {
            status: self.status,
            meta: clean_meta(self.meta),
            body: self.body,
        }
    }
}

// CR/LF would split the status line; the protocol caps meta at 1024 bytes.
fn clean_meta(meta: String) -> String {
    let mut meta = if meta.contains(['\r', '\n']) {
        meta.replace(['\r', '\n'], " ")
    } else {
        meta
    };

    if meta.len() > MAX_META_LEN {
        let mut end = MAX_META_LEN;
        while !meta.is_char_boundary(end) {
            end -= 1;
        }
        meta.truncate(end);
    }

    meta
}

impl Response {
    /// Creates a response with no body.
    pub fn new(status: StatusCode, meta: impl Into<String>) -> Self {
        ResponseBuilder::new(status).meta(meta).build()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn meta(&self) -> &str {
        &self.meta
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Serializes the response as `"<code> <meta>\r\n<body>"`.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(2 + 1 + self.meta.len() + 2 + self.body.len());
        buf.put_slice(self.status.code().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.meta.as_bytes());
        buf.put_slice(b"\r\n");
        buf.put_slice(&self.body);
        buf.freeze()
    }

    /// Parses wire bytes back into a response, as a client would.
    ///
    /// Returns `None` when the header line is missing, the code is unknown,
    /// or a non-success status is followed by body bytes.
    pub fn parse(bytes: &[u8]) -> Option<Response> {
        let header_end = bytes.windows(2).position(|w| w == b"\r\n")?;
        let header = std::str::from_utf8(&bytes[..header_end]).ok()?;
        let body = &bytes[header_end + 2..];

        let (code, meta) = header.split_once(' ').unwrap_or((header, ""));
        let status = StatusCode::from_code(code)?;

        if !body.is_empty() && !status.allows_body() {
            return None;
        }

        Some(Response {
            status,
            meta: meta.to_string(),
            body: Bytes::copy_from_slice(body),
        })
    }

    // Input

    pub fn input(prompt: impl Into<String>) -> Self {
        Self::new(StatusCode::Input, prompt)
    }

    pub fn sensitive_input(prompt: impl Into<String>) -> Self {
        Self::new(StatusCode::SensitiveInput, prompt)
    }

    // Success

    /// Creates a 20 response carrying `body`, with `mime_type` as meta.
    pub fn success(mime_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(StatusCode::Success)
            .meta(mime_type)
            .body(body)
            .build()
    }

    // Redirect

    pub fn redirect_temporary(url: impl Into<String>) -> Self {
        Self::new(StatusCode::RedirectTemporary, url)
    }

    pub fn redirect_permanent(url: impl Into<String>) -> Self {
        Self::new(StatusCode::RedirectPermanent, url)
    }

    // Temporary failure

    pub fn temporary_failure(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TemporaryFailure, message)
    }

    pub fn server_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ServerUnavailable, message)
    }

    pub fn cgi_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CgiError, message)
    }

    pub fn proxy_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ProxyError, message)
    }

    pub fn slow_down(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SlowDown, message)
    }

    // Permanent failure

    pub fn permanent_failure(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PermanentFailure, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    pub fn gone(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Gone, message)
    }

    pub fn proxy_request_refused(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ProxyRequestRefused, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BadRequest, message)
    }

    // Authorization

    pub fn client_certificate_required(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ClientCertificateRequired, message)
    }

    pub fn certificate_not_authorised(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CertificateNotAuthorised, message)
    }

    pub fn certificate_not_valid(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CertificateNotValid, message)
    }
}

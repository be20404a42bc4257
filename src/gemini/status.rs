use std::fmt;

/// Gemini status categories, fixed by the leading digit of the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// 1x - the client should prompt the user for input
    Input,
    /// 2x - the request was handled and a body follows
    Success,
    /// 3x - the resource lives at another URL
    Redirect,
    /// 4x - the request failed but may succeed later
    TemporaryFailure,
    /// 5x - the request failed and will keep failing
    PermanentFailure,
    /// 6x - a client certificate is needed or was rejected
    Authorization,
}

impl Category {
    /// Classifies any two-digit status code by its leading digit.
    ///
    /// ```
    /// # use capsule::gemini::status::Category;
    /// assert_eq!(Category::from_code("44"), Some(Category::TemporaryFailure));
    /// assert_eq!(Category::from_code("7"), None);
    /// ```
    pub fn from_code(code: &str) -> Option<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 2 || !bytes[1].is_ascii_digit() {
            return None;
        }

        match bytes[0] {
            b'1' => Some(Category::Input),
            b'2' => Some(Category::Success),
            b'3' => Some(Category::Redirect),
            b'4' => Some(Category::TemporaryFailure),
            b'5' => Some(Category::PermanentFailure),
            b'6' => Some(Category::Authorization),
            _ => None,
        }
    }
}

/// Status codes a Gemini server may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 10 Input
    Input,
    /// 11 Sensitive input
    SensitiveInput,
    /// 20 Success
    Success,
    /// 30 Temporary redirect
    RedirectTemporary,
    /// 31 Permanent redirect
    RedirectPermanent,
    /// 40 Temporary failure
    TemporaryFailure,
    /// 41 Server unavailable
    ServerUnavailable,
    /// 42 CGI error
    CgiError,
    /// 43 Proxy error
    ProxyError,
    /// 44 Slow down
    SlowDown,
    /// 50 Permanent failure
    PermanentFailure,
    /// 51 Not found
    NotFound,
    /// 52 Gone
    Gone,
    /// 53 Proxy request refused
    ProxyRequestRefused,
    /// 59 Bad request
    BadRequest,
    /// 60 Client certificate required
    ClientCertificateRequired,
    /// 61 Certificate not authorised
    CertificateNotAuthorised,
    /// 62 Certificate not valid
    CertificateNotValid,
}

impl StatusCode {
    pub const ALL: [StatusCode; 18] = [
        StatusCode::Input,
        StatusCode::SensitiveInput,
        StatusCode::Success,
        StatusCode::RedirectTemporary,
        StatusCode::RedirectPermanent,
        StatusCode::TemporaryFailure,
        StatusCode::ServerUnavailable,
        StatusCode::CgiError,
        StatusCode::ProxyError,
        StatusCode::SlowDown,
        StatusCode::PermanentFailure,
        StatusCode::NotFound,
        StatusCode::Gone,
        StatusCode::ProxyRequestRefused,
        StatusCode::BadRequest,
        StatusCode::ClientCertificateRequired,
        StatusCode::CertificateNotAuthorised,
        StatusCode::CertificateNotValid,
    ];

    /// Returns the two-character code sent on the wire.
    ///
    /// ```
    /// # use capsule::gemini::status::StatusCode;
    /// assert_eq!(StatusCode::Success.code(), "20");
    /// assert_eq!(StatusCode::NotFound.code(), "51");
    /// ```
    pub fn code(&self) -> &'static str {
        match self {
            StatusCode::Input => "10",
            StatusCode::SensitiveInput => "11",
            StatusCode::Success => "20",
            StatusCode::RedirectTemporary => "30",
            StatusCode::RedirectPermanent => "31",
            StatusCode::TemporaryFailure => "40",
            StatusCode::ServerUnavailable => "41",
            StatusCode::CgiError => "42",
            StatusCode::ProxyError => "43",
            StatusCode::SlowDown => "44",
            StatusCode::PermanentFailure => "50",
            StatusCode::NotFound => "51",
            StatusCode::Gone => "52",
            StatusCode::ProxyRequestRefused => "53",
            StatusCode::BadRequest => "59",
            StatusCode::ClientCertificateRequired => "60",
            StatusCode::CertificateNotAuthorised => "61",
            StatusCode::CertificateNotValid => "62",
        }
    }

    pub fn as_u8(&self) -> u8 {
        let code = self.code().as_bytes();
        (code[0] - b'0') * 10 + (code[1] - b'0')
    }

    pub fn category(&self) -> Category {
        match self {
            StatusCode::Input | StatusCode::SensitiveInput => Category::Input,
            StatusCode::Success => Category::Success,
            StatusCode::RedirectTemporary | StatusCode::RedirectPermanent => Category::Redirect,
            StatusCode::TemporaryFailure
            | StatusCode::ServerUnavailable
            | StatusCode::CgiError
            | StatusCode::ProxyError
            | StatusCode::SlowDown => Category::TemporaryFailure,
            StatusCode::PermanentFailure
            | StatusCode::NotFound
            | StatusCode::Gone
            | StatusCode::ProxyRequestRefused
            | StatusCode::BadRequest => Category::PermanentFailure,
            StatusCode::ClientCertificateRequired
            | StatusCode::CertificateNotAuthorised
            | StatusCode::CertificateNotValid => Category::Authorization,
        }
    }

    /// Looks a status up by its wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        StatusCode::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Only success responses carry a body.
    pub fn allows_body(&self) -> bool {
        self.category() == Category::Success
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

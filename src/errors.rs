use once_cell::sync::Lazy;
use paperclip::actix::{api_v2_errors, Apiv2Schema};

#[derive(Debug, strum::EnumIter)]
pub enum ErrorKind {
    DBError(String),
    InvalidInput(String),
    InternalError(String),
    ParseError(String),
    InvalidAmount(String),
    ExceedsSupply(String),
}

/// Instead of utilizing HTTP status codes to describe projection errors (which
/// often do not have a good analog), rich errors are returned using this object.
#[api_v2_errors(
    code = 500,
    description = "See the inner `code` value to get more details"
)]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct Error {
    /// Code is a service-specific error code. If desired, this code can be
    /// equivalent to an HTTP status code.
    pub code: u32,

    /// Message is a service-specific error message.
    pub message: String,

    /// An error is retriable if the same request may succeed if submitted
    /// again.
    pub retriable: bool,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let retriable = if self.retriable { " (retriable)" } else { "" };
        write!(f, "Error #{}{}: {}", self.code, retriable, self.message)
    }
}

impl Error {
    pub fn from_error_kind(err: ErrorKind) -> Self {
        match err {
            ErrorKind::DBError(message) => Self {
                code: 500,
                message: format!("DB Error: {}", message),
                retriable: true,
            },
            ErrorKind::InvalidInput(message) => Self {
                code: 400,
                message: format!("Invalid Input: {}", message),
                retriable: false,
            },
            ErrorKind::InternalError(message) => Self {
                code: 500,
                message: format!("Internal Error: {}", message),
                retriable: true,
            },
            ErrorKind::ParseError(message) => Self {
                code: 400,
                message: format!("Parse Error: {}", message),
                retriable: false,
            },
            ErrorKind::InvalidAmount(message) => Self {
                code: 400,
                message: format!("Invalid Amount: {}", message),
                retriable: false,
            },
            ErrorKind::ExceedsSupply(message) => Self {
                code: 400,
                message: format!("Exceeds Supply: {}", message),
                retriable: false,
            },
        }
    }
}

impl<T> From<T> for Error
where
    T: Into<ErrorKind>,
{
    fn from(err: T) -> Self {
        Self::from_error_kind(err.into())
    }
}

impl actix_web::ResponseError for Error {
    fn error_response(&self) -> actix_web::HttpResponse {
        let data = paperclip::actix::web::Json(self);
        actix_web::HttpResponse::InternalServerError().json(data)
    }
}

impl From<serde_json::Error> for ErrorKind {
    fn from(error: serde_json::Error) -> Self {
        Self::InternalError(format!("Serialization failure: {:#?}", error))
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(error: std::io::Error) -> Self {
        Self::InternalError(format!("IO failure: {:#?}", error))
    }
}

static USER_ID_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"^[a-z0-9.-]{1,32}$").unwrap());
static SYMBOL_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"^[A-Z0-9]{1,12}$").unwrap());

pub(crate) fn validate_user_id(user_id: &str) -> Result<(), validator::ValidationError> {
    if USER_ID_RE.is_match(user_id) {
        Ok(())
    } else {
        Err(validator::ValidationError::new(""))
    }
}

pub(crate) fn validate_symbol(symbol: &str) -> Result<(), validator::ValidationError> {
    if SYMBOL_RE.is_match(symbol) {
        Ok(())
    } else {
        Err(validator::ValidationError::new(""))
    }
}

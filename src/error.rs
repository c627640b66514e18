use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocSqlErrorCode {
    InvalidArgument,
    Backend,
    Internal,
    NotFound,
    Serialization,
    ResourceExhausted,
}

impl DocSqlErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocSqlErrorCode::InvalidArgument => "docsql/invalid-argument",
            DocSqlErrorCode::Backend => "docsql/backend-error",
            DocSqlErrorCode::Internal => "docsql/internal",
            DocSqlErrorCode::NotFound => "docsql/not-found",
            DocSqlErrorCode::Serialization => "docsql/serialization",
            DocSqlErrorCode::ResourceExhausted => "docsql/resource-exhausted",
        }
    }
}

#[derive(Clone, Debug)]
pub struct DocSqlError {
    pub code: DocSqlErrorCode,
    message: String,
}

impl DocSqlError {
    pub fn new(code: DocSqlErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for DocSqlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for DocSqlError {}

pub type DocSqlResult<T> = Result<T, DocSqlError>;

pub fn invalid_argument(message: impl Into<String>) -> DocSqlError {
    DocSqlError::new(DocSqlErrorCode::InvalidArgument, message)
}

pub fn backend_error(message: impl Into<String>) -> DocSqlError {
    DocSqlError::new(DocSqlErrorCode::Backend, message)
}

pub fn internal_error(message: impl Into<String>) -> DocSqlError {
    DocSqlError::new(DocSqlErrorCode::Internal, message)
}

pub fn not_found(message: impl Into<String>) -> DocSqlError {
    DocSqlError::new(DocSqlErrorCode::NotFound, message)
}

pub fn serialization_error(message: impl Into<String>) -> DocSqlError {
    DocSqlError::new(DocSqlErrorCode::Serialization, message)
}

pub fn resource_exhausted(message: impl Into<String>) -> DocSqlError {
    DocSqlError::new(DocSqlErrorCode::ResourceExhausted, message)
}

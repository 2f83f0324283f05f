use std::fmt::{self, Display};

use potion::Error;
use warp::{http::StatusCode, reject::Reject};

#[derive(Debug)]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            e => Self::new(format!("{e}")),
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

impl Into<Error> for QueryError {
    fn into(self) -> Error {
        Error {
            code: 500,
            info: Some(self.info),
            redirect: None,
        }
    }
}

#[derive(Debug)]
pub struct CacheError {
    info: String,
}

impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self {
            info: format!("{:?} - {:?}", value.code(), value.detail()),
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(value: serde_json::Error) -> Self {
        Self {
            info: format!("Failed to (de)serialize cached value: {value}"),
        }
    }
}

impl Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

impl Into<Error> for CacheError {
    fn into(self) -> Error {
        Error {
            code: 500,
            info: Some(self.info),
            redirect: None,
        }
    }
}

/// Failure of an SDK action.
///
/// `NotFound`, `Conflict` and `Validation` are raised before anything is
/// committed, so the store is left exactly as it was.
#[derive(Debug)]
pub enum ActionError {
    NotFound(String),
    Conflict(String),
    Validation(String),
    Unauthorized(String),
    Internal(String),
    Query(QueryError),
    Cache(CacheError),
}

impl ActionError {
    pub fn not_found(info: &str) -> Self {
        Self::NotFound(info.to_string())
    }

    pub fn conflict(info: &str) -> Self {
        Self::Conflict(info.to_string())
    }

    pub fn validation(info: &str) -> Self {
        Self::Validation(info.to_string())
    }

    pub fn unauthorized(info: &str) -> Self {
        Self::Unauthorized(info.to_string())
    }

    pub fn internal(info: &str) -> Self {
        Self::Internal(info.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ActionError::NotFound(_) => StatusCode::NOT_FOUND,
            ActionError::Conflict(_) | ActionError::Validation(_) => StatusCode::BAD_REQUEST,
            ActionError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ActionError::Internal(_) | ActionError::Query(_) | ActionError::Cache(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for ActionError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = value {
            return Self::not_found("Requested row doesn't exist");
        }

        if let sqlx::Error::Database(e) = &value {
            if e.is_unique_violation() {
                return Self::Conflict(format!("Already exists ({})", e.message()));
            }
            if e.is_foreign_key_violation() {
                return Self::NotFound(format!("Referenced row doesn't exist ({})", e.message()));
            }
            if e.is_check_violation() {
                return Self::Validation(format!("Invalid value ({})", e.message()));
            }
        }

        Self::Query(QueryError::from(value))
    }
}

impl From<CacheError> for ActionError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

impl Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::NotFound(info)
            | ActionError::Conflict(info)
            | ActionError::Validation(info)
            | ActionError::Unauthorized(info)
            | ActionError::Internal(info) => write!(f, "{info}"),
            ActionError::Query(e) => write!(f, "{e}"),
            ActionError::Cache(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ActionError {}
impl Reject for ActionError {}

impl Into<Error> for ActionError {
    fn into(self) -> Error {
        let code = self.status_code().as_u16().into();
        match self {
            ActionError::NotFound(info)
            | ActionError::Conflict(info)
            | ActionError::Validation(info)
            | ActionError::Unauthorized(info)
            | ActionError::Internal(info) => Error {
                code,
                info: Some(info),
                redirect: None,
            },
            ActionError::Query(e) => e.into(),
            ActionError::Cache(e) => e.into(),
        }
    }
}

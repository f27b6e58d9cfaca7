use thiserror::Error;

use crate::engine::RetCode;

#[derive(Debug, Error)]
pub enum AbstractError {
    #[error("ta-abstract: initialization failed: {0}")]
    Initialization(String),
    #[error("ta-abstract: catalog query failed: {status}")]
    Catalog { status: RetCode },
    #[error("ta-abstract: unknown function '{0}'")]
    UnknownFunction(String),
    #[error("ta-abstract: invalid argument: {0}")]
    InvalidArgument(String),
    #[error("ta-abstract: {function} failed: {status}")]
    Computation { function: String, status: RetCode },
}

impl AbstractError {
    /// Native status behind the error, when there is one.
    pub fn status(&self) -> Option<RetCode> {
        match self {
            AbstractError::Catalog { status } | AbstractError::Computation { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AbstractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_native_status() {
        let e = AbstractError::Computation {
            function: "MA".into(),
            status: RetCode::BAD_PARAM,
        };
        assert_eq!(e.to_string(), "ta-abstract: MA failed: TA_BAD_PARAM(2)");
        assert_eq!(e.status(), Some(RetCode::BAD_PARAM));
        assert_eq!(AbstractError::UnknownFunction("XYZ".into()).status(), None);
    }
}

//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::Application(e.into())
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Application(e) => application_exit_code(e),
        }
    }
}

// A script error exits with the code of the failure on its line
fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::Domain(_) | ApplicationError::Json(_) => crate::exitcode::DATAERR,
        ApplicationError::Config { .. } => crate::exitcode::CONFIG,
        ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
        ApplicationError::Script { source, .. } => application_exit_code(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeId;

    #[test]
    fn test_exit_codes() {
        let err: CliError = DomainError::NodeNotFound(NodeId(3)).into();
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);

        let err = CliError::Application(ApplicationError::Script {
            line: 2,
            source: Box::new(ApplicationError::Config {
                message: "x".into(),
            }),
        });
        assert_eq!(err.exit_code(), crate::exitcode::CONFIG);

        let err = CliError::Application(ApplicationError::Script {
            line: 4,
            source: Box::new(ApplicationError::Domain(DomainError::DepthExceeded {
                depth: 9,
                max: 8,
            })),
        });
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);

        assert_eq!(
            CliError::Usage("no command".into()).exit_code(),
            crate::exitcode::USAGE
        );
    }
}

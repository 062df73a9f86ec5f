//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::traits::HttpError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::Domain(e).into()
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::Remote { .. } | ApplicationError::Payload { .. } => {
                        crate::exitcode::DATAERR
                    }
                    ApplicationError::OperationFailed { source, .. }
                        if source.is::<HttpError>() =>
                    {
                        crate::exitcode::UNAVAILABLE
                    }
                    ApplicationError::OperationFailed { .. } => crate::exitcode::SOFTWARE,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_error_layers_when_mapping_exit_code_then_follows_sysexits() {
        let unknown: CliError = DomainError::UnknownNode("x".into()).into();
        let config: CliError = ApplicationError::Config {
            message: "no url".into(),
        }
        .into();
        assert_eq!(unknown.exit_code(), crate::exitcode::DATAERR);
        assert_eq!(config.exit_code(), crate::exitcode::CONFIG);
        assert_eq!(
            CliError::Usage("bad".into()).exit_code(),
            crate::exitcode::USAGE
        );

        let offline: CliError = ApplicationError::OperationFailed {
            context: "fetch https://example.com".into(),
            source: Box::new(HttpError::Transport("dns".into())),
        }
        .into();
        assert_eq!(offline.exit_code(), crate::exitcode::UNAVAILABLE);
    }
}

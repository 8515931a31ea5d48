//! Path context for errors raised while reading input files.

use std::error::Error;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Attach the file and the failed step to any error from reading or parsing it.
pub trait PathContextExt<T> {
    /// # Example
    /// ```ignore
    /// std::fs::read_to_string(&path).with_path_context("read script", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T, E> PathContextExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_names_action_and_path() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));

        let err = result
            .with_path_context("read script", Path::new("ops.jsonl"))
            .unwrap_err();

        assert_eq!(err.to_string(), "operation failed: read script: ops.jsonl");
        assert!(std::error::Error::source(&err).is_some());
    }
}

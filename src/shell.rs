use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use tokio::process::Command;

use crate::error::N1qlMiddlewareDbError;

/// Location of the interactive N1QL shell shipped with Couchbase Server.
pub const CBQ_EXECUTABLE: &str = "/opt/couchbase/bin/cbq";

/// Launches the database's interactive shell.
#[derive(Debug, Clone)]
pub struct DatabaseClient {
    executable: PathBuf,
}

impl Default for DatabaseClient {
    fn default() -> Self {
        Self::new(CBQ_EXECUTABLE)
    }
}

impl DatabaseClient {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run the shell with no arguments, inheriting stdio, and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns `N1qlMiddlewareDbError::OperationalError` if the process cannot be spawned.
    pub async fn run_shell(&self) -> Result<ExitStatus, N1qlMiddlewareDbError> {
        tracing::debug!(executable = %self.executable.display(), "launching shell");
        Command::new(&self.executable).status().await.map_err(|e| {
            N1qlMiddlewareDbError::OperationalError(format!(
                "Failed to launch {}: {e}",
                self.executable.display()
            ))
        })
    }
}

use std::path::PathBuf;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Triplet parse error type
pub enum TripletErr {
    /// Fewer than three dash separated components
    #[error("no valid triplet: '{0}' (expected <os>-<arch>-<variant>)")]
    NoValidTriplet(String),
}

#[derive(thiserror::Error, Debug)]
/// Errors raised by the UPX wrapper
pub enum UpxErr {
    /// `upx` could not be executed at all
    #[error("upx binary not available")]
    NotInstalled,

    /// `upx` is installed but older than the supported minimum
    #[error("UPX version '{found}' is not supported (need {required}+)")]
    Unsupported { found: String, required: String },

    /// Spawning or waiting on `upx` failed
    #[error("failed to execute upx")]
    Invocation(#[source] std::io::Error),

    /// `upx` exited unsuccessfully
    #[error("upx exited with {status}")]
    Failed { status: std::process::ExitStatus },

    /// The report printed by `upx` did not have the expected shape
    #[error("UPX output is in wrong format: {0}")]
    WrongFormat(String),
}

#[derive(thiserror::Error, Debug)]
/// Configuration error type, raised before any build starts
pub enum CfgErr {
    /// No entry file argument
    #[error("no entry file given")]
    NoEntryFile,

    /// Entry file does not exist or cannot be resolved
    #[error("no valid path for entry file given: {}", .0.display())]
    NoValidEntryFilePath(PathBuf),

    /// Dist directory could not be made absolute
    #[error("no valid path for dist dir given")]
    NoValidDistPath(#[source] std::io::Error),

    /// The Go toolchain could not be queried
    #[error("Go toolchain not found: {0}")]
    ToolchainNotFound(String),
}

#[derive(thiserror::Error, Debug)]
/// Crossbuild error type
pub enum BuildErr {
    /// A target asked for compression but UPX is unusable
    #[error("upx binary not available")]
    NoUpxAvailable,

    /// The compiler exited unsuccessfully for a target
    #[error("build for {target} failed with {status}")]
    BuildFailed {
        target: String,
        status: std::process::ExitStatus,
    },

    /// The compiler could not be spawned for a target
    #[error("failed to run the compiler for {target}")]
    Spawn {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The dist directory could not be cleared or created
    #[error("failed to prepare dist directory {}", .path.display())]
    DistDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid command line configuration
    #[error(transparent)]
    Config(#[from] CfgErr),
}

impl BuildErr {
    /// Get error recovery suggestions if available
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NoUpxAvailable => Some(
                "Install UPX 3.95 or newer, point --upx-bin at it, or drop the --upx flag."
                    .to_string(),
            ),
            Self::Spawn { .. } => Some(
                "Check that the Go toolchain (and for --cgo builds the cross C compiler) is on PATH."
                    .to_string(),
            ),
            Self::DistDir { path, .. } => Some(format!(
                "Check the permissions of '{}' and its parent directory.",
                path.display()
            )),
            Self::Config(CfgErr::ToolchainNotFound(_)) => {
                Some("Install Go or pass its location with --go <PATH>.".to_string())
            }
            Self::Config(CfgErr::NoValidEntryFilePath(_)) => {
                Some("Pass the path to an existing main package file, e.g. ./cmd/app/main.go".to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_suggestions() {
        assert!(BuildErr::NoUpxAvailable.recovery_suggestion().is_some());
        assert!(
            BuildErr::from(CfgErr::ToolchainNotFound("go".into()))
                .recovery_suggestion()
                .is_some()
        );
        assert!(BuildErr::from(CfgErr::NoEntryFile).recovery_suggestion().is_none());
    }

    #[test]
    fn test_triplet_error_message_names_input() {
        let err = TripletErr::NoValidTriplet("linux".into());
        assert!(err.to_string().contains("'linux'"));
    }
}

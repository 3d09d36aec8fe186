use super::build::Invocation;
use crate::{BuildErr, CfgErr};
use semver::Version;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const TARGET: &str = "crossbuild::toolchain";

/// First Go release with `-trimpath` and comma separated `-tags`
const TRIMPATH_SINCE: Version = Version::new(1, 13, 0);

/// Flag syntax supported by the host Go toolchain, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolchainCaps {
    /// `go build -trimpath` is available
    pub trimpath: bool,
    /// Separator for the `-tags` list
    pub tag_separator: char,
}

impl ToolchainCaps {
    pub fn for_version(version: &Version) -> Self {
        if *version >= TRIMPATH_SINCE {
            Self {
                trimpath: true,
                tag_separator: ',',
            }
        } else {
            Self {
                trimpath: false,
                tag_separator: ' ',
            }
        }
    }
}

impl Default for ToolchainCaps {
    fn default() -> Self {
        Self::for_version(&TRIMPATH_SINCE)
    }
}

/// Something that can run a prepared `go build` invocation
pub trait Toolchain {
    fn caps(&self) -> ToolchainCaps;

    /// Run the invocation to completion
    async fn compile(&self, invocation: &Invocation) -> Result<(), BuildErr>;
}

/// The host `go` executable
#[derive(Debug, Clone)]
pub struct GoToolchain {
    program: PathBuf,
    /// As reported, e.g. `go1.21.3`
    version: String,
    caps: ToolchainCaps,
}

impl GoToolchain {
    /// Query `go version` and resolve the supported flag syntax
    pub async fn detect(program: impl AsRef<Path>) -> Result<Self, CfgErr> {
        let program = program.as_ref().to_path_buf();
        let output = Command::new(&program)
            .arg("version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CfgErr::ToolchainNotFound(format!("{}: {e}", program.display())))?;

        if !output.status.success() {
            return Err(CfgErr::ToolchainNotFound(format!(
                "`{} version` exited with {}",
                program.display(),
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = version_token(&stdout)
            .ok_or_else(|| CfgErr::ToolchainNotFound(format!("unrecognized output: {}", stdout.trim())))?
            .to_string();

        let caps = match parse_go_version(&version) {
            Some(v) => ToolchainCaps::for_version(&v),
            None => {
                tracing::warn!(
                    target: TARGET,
                    "Could not parse Go version '{version}', assuming a modern toolchain"
                );
                ToolchainCaps::default()
            }
        };
        tracing::debug!(target: TARGET, "Detected {version} at {} ({caps:?})", program.display());

        Ok(Self {
            program,
            version,
            caps,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Toolchain for GoToolchain {
    fn caps(&self) -> ToolchainCaps {
        self.caps
    }

    async fn compile(&self, invocation: &Invocation) -> Result<(), BuildErr> {
        tracing::debug!(
            target: TARGET,
            "{} {} (env: {:?})",
            self.program.display(),
            invocation.args.join(" "),
            invocation.envs
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&invocation.args)
            .envs(invocation.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .stdout(if invocation.verbose {
                Stdio::inherit()
            } else {
                Stdio::null()
            });

        let status = cmd.status().await.map_err(|source| BuildErr::Spawn {
            target: invocation.target.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildErr::BuildFailed {
                target: invocation.target.clone(),
                status,
            })
        }
    }
}

/// Pick `go1.21.3` out of `go version go1.21.3 linux/amd64`
fn version_token(output: &str) -> Option<&str> {
    output
        .split_whitespace()
        .find(|tok| tok.strip_prefix("go").is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit())))
}

/// `go1.21.3` -> 1.21.3, `go1.13` -> 1.13.0, `go1.22rc1` -> 1.22.0
fn parse_go_version(token: &str) -> Option<Version> {
    token.strip_prefix("go").and_then(crate::tools::loose_version)
}

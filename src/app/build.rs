use super::toolchain::{Toolchain, ToolchainCaps};
use crate::{Arch, BuildErr, BuildOptions, Meta, Triplet};
use std::path::{Path, PathBuf};

/// Tags for a fully static build
pub const TAGS: &[&str] = &["osusergo", "netgo", "static_build"];

/// Extra linker flags for static cgo builds
const CGO_LDFLAGS: &str = "-extldflags '-fno-PIC -static' -linkmode=external";

/// A fully derived `go build` call for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Target in display form, used for error reporting
    pub target: String,
    /// Arguments after the `go` program name
    pub args: Vec<String>,
    /// Environment overrides on top of the inherited environment
    pub envs: Vec<(String, String)>,
    pub output: PathBuf,
    /// Forward the compiler's stdout
    pub verbose: bool,
}

/// One target plus the options it is built with
#[derive(Debug, Clone, Copy)]
pub struct Build<'a> {
    pub target: &'a Triplet,
    pub options: BuildOptions,
}

impl<'a> Build<'a> {
    pub fn new(target: &'a Triplet, options: BuildOptions) -> Self {
        Self { target, options }
    }

    pub fn upx_level(&self) -> u8 {
        self.options.upx_level
    }

    /// A musl build only makes sense with cgo
    pub fn is_noop(&self) -> bool {
        !self.options.cgo && self.target.variant.is_musl()
    }

    /// Derive the compiler call, or `None` if this target is skipped
    pub fn invocation(
        &self,
        meta: &Meta,
        caps: ToolchainCaps,
        dist_dir: &Path,
        entry_file: &Path,
    ) -> Option<Invocation> {
        if self.is_noop() {
            return None;
        }

        let output = dist_dir.join(self.target.filename(&meta.name));

        let mut args = vec!["build".to_string(), "-a".to_string()];
        if caps.trimpath {
            args.push("-trimpath".to_string());
        }
        args.push("-tags".to_string());
        args.push(TAGS.join(&caps.tag_separator.to_string()));
        args.push("-ldflags".to_string());
        args.push(self.ldflags(meta));
        args.push("-o".to_string());
        args.push(output.to_string_lossy().into_owned());
        args.push(entry_file.to_string_lossy().into_owned());

        Some(Invocation {
            target: self.target.to_string(),
            args,
            envs: self.envs(),
            output,
            verbose: self.options.verbose,
        })
    }

    fn ldflags(&self, meta: &Meta) -> String {
        let mut flags = String::from("-s -w ");

        let mut inject = |var: &str, value: &str| {
            flags.push_str(&format!(r#"-X "main.{var}={value}" "#));
        };
        inject("BuilderBuilt", &meta.build_time);
        inject("BuilderGo", &meta.go_version);
        if let Some(upx) = &meta.upx_version {
            inject("BuilderUPX", upx);
        }
        if let Some(git) = &meta.git_commit {
            inject("BuilderGit", git);
        }
        if let Some(version) = &meta.user_version {
            inject("BuilderVersion", version);
        }

        if self.options.cgo {
            flags.push_str(CGO_LDFLAGS);
        }
        flags.trim_end().to_string()
    }

    fn envs(&self) -> Vec<(String, String)> {
        let t = self.target;
        let mut envs = vec![
            ("GOOS".to_string(), t.platform.as_str().to_string()),
            ("GOARCH".to_string(), t.arch.as_str().to_string()),
        ];

        if t.arch == Arch::Arm && !t.variant.is_none() {
            envs.push(("GOARM".to_string(), t.variant.as_str().into_owned()));
        }

        if self.options.cgo {
            envs.push(("CGO_ENABLED".to_string(), "1".to_string()));
            match t.compiler() {
                Some(cc) => envs.push(("CC".to_string(), cc.to_string())),
                None => tracing::debug!("No cross C compiler known for {t}, keeping CC from the environment"),
            }
        }
        envs
    }

    /// Build this target. `Ok(None)` means the target was skipped without running anything.
    pub async fn run(
        &self,
        toolchain: &impl Toolchain,
        meta: &Meta,
        dist_dir: &Path,
        entry_file: &Path,
    ) -> Result<Option<PathBuf>, BuildErr> {
        let Some(invocation) = self.invocation(meta, toolchain.caps(), dist_dir, entry_file) else {
            tracing::info!("Skipping {}: musl builds require --cgo", self.target);
            return Ok(None);
        };

        toolchain.compile(&invocation).await?;
        Ok(Some(invocation.output))
    }
}

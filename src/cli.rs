use crate::{
    BuildErr, BuildOptions, CfgErr, Meta, Triplets,
    app::{Build, Builder, Compressor, GoToolchain, Upx},
    suggest,
    tools::{self, error},
};
use clap::Parser;
use std::path::{Path, PathBuf};

pub async fn crossbuild_main() -> super::Result<()> {
    let cli = <CrossbuildCli as clap::Parser>::parse();
    let now = chrono::Utc::now();

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            error(e.to_string());
            if let Some(hint) = BuildErr::from(e).recovery_suggestion() {
                suggest!("{}", hint);
            }
            suggest!("Run {} for usage", cmd = "crossbuild --help");
            std::process::exit(2);
        }
    };

    let toolchain = GoToolchain::detect(&config.go)
        .await
        .map_err(|e| report(BuildErr::from(e)))?;

    let upx = Upx::detect(&config.upx_bin).await;
    if let Some(version) = upx.version() {
        tracing::info!("Detected upx {version}");
    } else if config.options.wants_upx() {
        tools::warn(format!(
            "--upx {} requested but no usable upx was found",
            config.options.upx_level
        ));
    }

    tracing::debug!("Targets: {}", config.targets);

    let meta = config.meta(now, toolchain.version(), upx.version());
    let builds = config
        .targets
        .iter()
        .map(|target| Build::new(target, config.options))
        .collect();

    let builder = Builder::new(
        builds,
        meta,
        config.entry_file.clone(),
        config.dist_dir.clone(),
        toolchain,
        upx,
    );
    let run = builder.start().await.map_err(report)?;

    tracing::debug!(
        "{} built, {} skipped, {} packed, {} upx failures",
        run.built.len(),
        run.skipped.len(),
        run.packed.len(),
        run.upx_failures.len()
    );
    Ok(())
}

/// Print the recovery hint, if any, and hand the error to color-eyre
fn report(err: BuildErr) -> color_eyre::Report {
    if let Some(hint) = err.recovery_suggestion() {
        suggest!("{}", hint);
    }
    err.into()
}

/// crossbuild - build a Go program for many platforms at once
#[derive(Parser, Debug)]
#[command(name = "crossbuild")]
#[command(
    author,
    version,
    about = "crossbuild - cross-compile a Go program for many platforms",
    long_about = "Builds a Go main package once per target triplet (<os>-<arch>-<variant>) into a \
    fresh dist directory, optionally packs every binary with UPX, and injects build metadata \
    (date, Go version, UPX version, git commit, version) into main.Builder* variables."
)]
pub struct CrossbuildCli {
    /// Path to the main package entry file, e.g. ./cmd/app/main.go
    pub entry_file: PathBuf,

    /// Enable cgo and cross C compilers (e.g. for github.com/mattn/go-sqlite3)
    #[arg(long)]
    pub cgo: bool,

    /// The output directory for the binaries. It is deleted and recreated!
    #[arg(long, default_value = "./dist")]
    pub dist: PathBuf,

    /// The name of the binary (defaults to the entry file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Comma separated targets, may be repeated
    #[arg(
        long = "target",
        short = 't',
        value_parser = clap::value_parser!(Triplets),
        long_help = "Comma separated list of <os>-<arch>-<variant> triplets, may be repeated. \
                     The variant is an ARM profile or `musl` and may be empty (`linux-amd64-`).\n\
                     Defaults to: windows-amd64-,linux-amd64-,linux-amd64-musl,linux-arm-6,linux-arm-7,linux-arm64-"
    )]
    pub targets: Vec<Triplets>,

    /// Binary compression with upx (0=disabled / 1=faster / 9=better)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub upx: u8,

    /// Show stdout and stderr from go build and upx
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Git commit hash injected into main.BuilderGit
    #[arg(long = "git")]
    pub git_commit: Option<String>,

    /// Version injected into main.BuilderVersion
    #[arg(long = "app-version")]
    pub user_version: Option<String>,

    /// Go toolchain executable
    #[arg(long, default_value = "go")]
    pub go: PathBuf,

    /// UPX executable
    #[arg(long = "upx-bin", default_value = "upx")]
    pub upx_bin: PathBuf,
}

/// Everything a run needs, resolved from the command line
#[derive(Debug, Clone)]
pub struct Config {
    pub entry_file: PathBuf,
    pub dist_dir: PathBuf,
    pub name: String,
    pub targets: Triplets,
    pub options: BuildOptions,
    pub git_commit: Option<String>,
    pub user_version: Option<String>,
    pub go: PathBuf,
    pub upx_bin: PathBuf,
}

impl CrossbuildCli {
    pub fn into_config(self) -> Result<Config, CfgErr> {
        if self.entry_file.as_os_str().is_empty() {
            return Err(CfgErr::NoEntryFile);
        }
        let entry_file = dunce::canonicalize(&self.entry_file)
            .map_err(|_| CfgErr::NoValidEntryFilePath(self.entry_file.clone()))?;
        if !entry_file.is_file() {
            return Err(CfgErr::NoValidEntryFilePath(self.entry_file));
        }

        let dist_dir = std::path::absolute(&self.dist).map_err(CfgErr::NoValidDistPath)?;

        let name = non_empty(self.name).unwrap_or_else(|| detect_name(&entry_file));

        let targets: Triplets = self.targets.into_iter().flat_map(|t| t.0).collect();
        let targets = if targets.is_empty() {
            Triplets::defaults()
        } else {
            targets
        };

        Ok(Config {
            entry_file,
            dist_dir,
            name,
            targets,
            options: BuildOptions {
                cgo: self.cgo,
                upx_level: self.upx,
                verbose: self.verbose,
            },
            git_commit: non_empty(self.git_commit),
            user_version: non_empty(self.user_version),
            go: self.go,
            upx_bin: self.upx_bin,
        })
    }
}

impl Config {
    pub fn meta(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        go_version: &str,
        upx_version: Option<&str>,
    ) -> Meta {
        Meta {
            build_time: Meta::build_time(now),
            go_version: go_version.to_string(),
            name: self.name.clone(),
            upx_version: upx_version.map(str::to_string),
            user_version: self.user_version.clone(),
            git_commit: self.git_commit.clone(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `.../cmd/<name>/main.go` gives `<name>`, anything else the file stem
fn detect_name(entry_file: &Path) -> String {
    let parent = entry_file.parent();
    let is_cmd_main = entry_file.file_name().is_some_and(|f| f == "main.go")
        && parent
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .is_some_and(|d| d == "cmd");

    if is_cmd_main {
        if let Some(name) = parent.and_then(Path::file_name) {
            return name.to_string_lossy().into_owned();
        }
    }

    entry_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Variant;

    fn entry(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "package main\n").unwrap();
        path
    }

    fn parse(args: &[&str]) -> Result<CrossbuildCli, clap::Error> {
        CrossbuildCli::try_parse_from(std::iter::once("crossbuild").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let main = entry(dir.path(), "server.go");

        let config = parse(&[main.to_str().unwrap()]).unwrap().into_config().unwrap();
        assert_eq!(config.name, "server");
        assert_eq!(config.targets, Triplets::defaults());
        assert_eq!(config.options, BuildOptions::default());
        assert!(config.dist_dir.is_absolute());
        assert!(config.dist_dir.ends_with("dist"));
        assert_eq!(config.go, PathBuf::from("go"));
        assert_eq!(config.git_commit, None);
    }

    #[test]
    fn test_name_from_cmd_layout() {
        let dir = tempfile::tempdir().unwrap();
        let main = entry(dir.path(), "cmd/webhook/main.go");

        let config = parse(&[main.to_str().unwrap()]).unwrap().into_config().unwrap();
        assert_eq!(config.name, "webhook");

        let config = parse(&[main.to_str().unwrap(), "--name", "hook"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.name, "hook");
    }

    #[test]
    fn test_targets_accumulate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let main = entry(dir.path(), "main.go");

        let config = parse(&[
            main.to_str().unwrap(),
            "--target",
            "linux-arm-7,linux-amd64-musl",
            "-t",
            "windows-amd64-",
            "--cgo",
            "--upx",
            "9",
            "--git",
            "abc123",
            "--app-version",
            "",
        ])
        .unwrap()
        .into_config()
        .unwrap();

        assert_eq!(config.targets.to_string(), "linux-arm-7,linux-amd64-musl,windows-amd64-");
        assert_eq!(config.targets.0[1].variant, Variant::Musl);
        assert!(config.options.cgo);
        assert_eq!(config.options.upx_level, 9);
        assert_eq!(config.git_commit.as_deref(), Some("abc123"));
        assert_eq!(config.user_version, None);
    }

    #[test]
    fn test_invalid_arguments_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let main = entry(dir.path(), "main.go");
        let main = main.to_str().unwrap();

        assert!(parse(&[main, "--upx", "10"]).is_err());
        assert!(parse(&[main, "--target", "linux"]).is_err());
        assert!(parse(&[main, "--target", "linux-arm-7,linux-amd64"]).is_err());
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_missing_entry_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.go");

        let err = parse(&[missing.to_str().unwrap()])
            .unwrap()
            .into_config()
            .unwrap_err();
        assert!(matches!(err, CfgErr::NoValidEntryFilePath(p) if p == missing));

        let err = parse(&[dir.path().to_str().unwrap()])
            .unwrap()
            .into_config()
            .unwrap_err();
        assert!(matches!(err, CfgErr::NoValidEntryFilePath(_)));
    }

    #[test]
    fn test_meta_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let main = entry(dir.path(), "main.go");
        let config = parse(&[main.to_str().unwrap(), "--app-version", "1.2.3"])
            .unwrap()
            .into_config()
            .unwrap();

        let now = chrono::DateTime::from_timestamp(0, 0).unwrap();
        let meta = config.meta(now, "go1.21.3", Some("4.2.1"));
        assert_eq!(meta.build_time, "Thu, 01 Jan 1970 00:00:00 UTC");
        assert_eq!(meta.go_version, "go1.21.3");
        assert_eq!(meta.name, "main");
        assert_eq!(meta.upx_version.as_deref(), Some("4.2.1"));
        assert_eq!(meta.user_version.as_deref(), Some("1.2.3"));
    }
}

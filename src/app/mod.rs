mod build;
mod toolchain;
mod upx;

pub use build::Build;
pub use toolchain::{GoToolchain, Toolchain};
pub use upx::{Compressor, Upx};

use crate::tools::{self, round_secs};
use crate::types::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use yansi::Paint;

const TARGET: &str = "crossbuild::builder";

const ASCII: &str = r" ___      _ _    _
| _ )_  _(_) |__| |___ _ _
| _ \ || | | / _' / -_) '_|
|___/\_,_|_|_\__,_\___|_|
";

/// What a finished run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Artifacts written by the compiler, in build order
    pub built: Vec<PathBuf>,
    /// Targets that were skipped without running the compiler
    pub skipped: Vec<String>,
    /// UPX packed siblings of `built`
    pub packed: Vec<PathBuf>,
    /// Artifacts whose compression failed
    pub upx_failures: Vec<PathBuf>,
}

/// Runs every build of a release in order and reports as it goes
#[derive(Debug)]
pub struct Builder<'a, T, C> {
    builds: Vec<Build<'a>>,
    meta: Meta,
    entry_file: PathBuf,
    dist_dir: PathBuf,
    toolchain: T,
    upx: C,
}

impl<'a, T: Toolchain, C: Compressor> Builder<'a, T, C> {
    pub fn new(
        builds: Vec<Build<'a>>,
        meta: Meta,
        entry_file: PathBuf,
        dist_dir: PathBuf,
        toolchain: T,
        upx: C,
    ) -> Self {
        Self {
            builds,
            meta,
            entry_file,
            dist_dir,
            toolchain,
            upx,
        }
    }

    /// Wipe the dist directory and build every target.
    ///
    /// A failing build or a missing UPX aborts the run; a failing UPX pass only warns.
    pub async fn start(&self) -> Result<RunReport, BuildErr> {
        self.print_banner();

        println!("delete and create dist directory '{}'", self.dist_dir.display());
        self.prepare_dist_dir()?;

        println!("Start the build process...\n");

        let started = Instant::now();
        let mut report = RunReport::default();
        let result = self.build_all(&mut report).await;

        println!(
            "\nAll builds finished after {}",
            round_secs(started.elapsed()).bold()
        );
        result.map(|()| report)
    }

    async fn build_all(&self, report: &mut RunReport) -> Result<(), BuildErr> {
        for build in &self.builds {
            if build.options.wants_upx() && !self.upx.available() {
                return Err(BuildErr::NoUpxAvailable);
            }

            println!(
                "{} Building {}...",
                Paint::cyan("*"),
                build.target.filename(&self.meta.name).bold()
            );

            let now = Instant::now();
            let spinner = tools::spinner(build.options.verbose, format!("go build ({})", build.target));
            let result = build
                .run(&self.toolchain, &self.meta, &self.dist_dir, &self.entry_file)
                .await;
            spinner.finish_and_clear();
            let dur = round_secs(now.elapsed());

            let path = match result {
                Ok(Some(path)) => path,
                Ok(None) => {
                    println!("\tskipping build...");
                    report.skipped.push(build.target.to_string());
                    continue;
                }
                Err(e) => {
                    println!("\t{} with '{e}' after {dur}", Paint::red("Build failed"));
                    return Err(e);
                }
            };
            println!("\tfinished after {dur}");
            report.built.push(path.clone());

            if build.options.wants_upx() {
                self.compress(&path, build.upx_level(), build.options.verbose, report)
                    .await;
            }
            println!();
        }
        Ok(())
    }

    async fn compress(&self, path: &Path, level: u8, verbose: bool, report: &mut RunReport) {
        println!("{} Compressing with UPX...", Paint::cyan("*"));

        let now = Instant::now();
        let spinner = tools::spinner(verbose, format!("upx -{level}"));
        let result = self.upx.compress(path, level, verbose).await;
        spinner.finish_and_clear();
        let dur = round_secs(now.elapsed());

        match result {
            Ok(res) => {
                println!(
                    "\t{} bytes -> {} bytes ({})",
                    res.uncompressed_size,
                    res.compressed_size,
                    Paint::green(&res.percent)
                );
                println!(
                    "\tfinished with algorithm '{}' and level '{level}' after {dur}",
                    res.algo
                );
                report.packed.push(upx::packed_path(path));
            }
            Err(e) => {
                tracing::warn!(target: TARGET, "UPX failed for {}: {e:?}", path.display());
                tools::warn(format!("UPX failed with '{e}' after {dur}"));
                report.upx_failures.push(path.to_path_buf());
            }
        }
    }

    fn prepare_dist_dir(&self) -> Result<(), BuildErr> {
        let dist_err = |source| BuildErr::DistDir {
            path: self.dist_dir.clone(),
            source,
        };

        if self.dist_dir.is_dir() {
            rda::remove_dir_all(&self.dist_dir).map_err(dist_err)?;
        } else if self.dist_dir.try_exists().map_err(dist_err)? {
            std::fs::remove_file(&self.dist_dir).map_err(dist_err)?;
        }
        std::fs::create_dir_all(&self.dist_dir).map_err(dist_err)
    }

    fn print_banner(&self) {
        use target_lexicon::HOST;

        let mut out = String::from(ASCII);
        out.push_str("===========================\n");
        out.push_str(&format!(
            "Start building '{}' with:\n",
            self.meta.name.bold()
        ));

        let mut row = |label: &str, value: &str| {
            out.push_str(&format!("\t{:<12}{value}\n", format!("{label}:")));
        };
        row("Built Date", &self.meta.build_time);
        row("Go version", &self.meta.go_version);
        row("Host", &HOST.to_string());
        if let Some(git) = &self.meta.git_commit {
            row("Git commit", git);
        }
        if let Some(version) = &self.meta.user_version {
            row("Version", version);
        }
        if let Some(upx) = self.upx.version() {
            row("UPX", upx);
        }

        println!("{out}");
    }
}

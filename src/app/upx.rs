use crate::UpxErr;
use regex::Regex;
use semver::Version;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;

const TARGET: &str = "crossbuild::upx";

/// Oldest UPX release whose report layout we understand
pub const MIN_UPX_VERSION: Version = Version::new(3, 95, 0);

/// Index of the `<size> -> <size> <ratio> <format>` line in the UPX report
const RESULT_LINE: usize = 6;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^upx\s+(\S+)").expect("valid upx version regex"));

static RESULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*->\s*(\d+)\D+?(\d+\.\d+%)[\s;]*(\S+)").expect("valid upx result regex")
});

/// Sizes as printed by UPX for one packed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpxResult {
    pub uncompressed_size: String,
    pub compressed_size: String,
    pub percent: String,
    /// Packer format column, e.g. `linux/amd64` or `NRV2B`
    pub algo: String,
}

/// Something that can pack a built artifact
pub trait Compressor {
    fn available(&self) -> bool;

    fn version(&self) -> Option<&str>;

    async fn compress(&self, path: &Path, level: u8, verbose: bool) -> Result<UpxResult, UpxErr>;
}

/// The external `upx` executable
#[derive(Debug, Clone, Default)]
pub struct Upx {
    program: PathBuf,
    version: Option<String>,
}

impl Upx {
    /// Query `upx --version`. Never fails: an unusable UPX is reported as unavailable.
    pub async fn detect(program: impl AsRef<Path>) -> Self {
        let program = program.as_ref().to_path_buf();
        let version = match Self::query_version(&program).await {
            Ok(v) => Some(v),
            Err(UpxErr::NotInstalled) => {
                tracing::debug!(target: TARGET, "{} not found", program.display());
                None
            }
            Err(e) => {
                tracing::warn!(target: TARGET, "{e}");
                None
            }
        };
        Self { program, version }
    }

    async fn query_version(program: &Path) -> Result<String, UpxErr> {
        let output = Command::new(program)
            .args(["--no-color", "--no-progress", "--version"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|_| UpxErr::NotInstalled)?;

        if !output.status.success() {
            return Err(UpxErr::NotInstalled);
        }
        check_version(&String::from_utf8_lossy(&output.stdout))
    }
}

impl Compressor for Upx {
    fn available(&self) -> bool {
        self.version.is_some()
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    async fn compress(&self, path: &Path, level: u8, verbose: bool) -> Result<UpxResult, UpxErr> {
        let target = packed_path(path);
        tracing::debug!(target: TARGET, "Packing {} -> {}", path.display(), target.display());

        let output = Command::new(&self.program)
            .arg("--no-color")
            .arg("--no-progress")
            .arg(format!("-{level}"))
            .arg("-o")
            .arg(&target)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(UpxErr::Invocation)?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if verbose {
            println!("{combined}");
        }

        if !output.status.success() {
            return Err(UpxErr::Failed {
                status: output.status,
            });
        }
        parse_result(&combined)
    }
}

/// Extract the version from `upx --version` and enforce [`MIN_UPX_VERSION`]
pub fn check_version(output: &str) -> Result<String, UpxErr> {
    let found = VERSION_RE
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| UpxErr::WrongFormat(format!("no version in '{}'", output.trim())))?;

    let unsupported = || UpxErr::Unsupported {
        found: found.clone(),
        required: format!("{}.{}", MIN_UPX_VERSION.major, MIN_UPX_VERSION.minor),
    };

    match crate::tools::loose_version(&found) {
        Some(v) if v >= MIN_UPX_VERSION => Ok(found),
        _ => Err(unsupported()),
    }
}

/// `dist/app.exe` -> `dist/app-upx.exe`, `dist/app` -> `dist/app-upx`
pub fn packed_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-upx.{}", ext.to_string_lossy()),
        None => format!("{stem}-upx"),
    };
    path.with_file_name(name)
}

/// Parse the size report printed by `upx` after packing one file
pub fn parse_result(output: &str) -> Result<UpxResult, UpxErr> {
    let line = output.lines().nth(RESULT_LINE).ok_or_else(|| {
        UpxErr::WrongFormat(format!(
            "expected at least {} lines, got {}",
            RESULT_LINE + 1,
            output.lines().count()
        ))
    })?;
    tracing::trace!(target: TARGET, "UPX result line: {line}");

    let caps = RESULT_RE
        .captures(line)
        .ok_or_else(|| UpxErr::WrongFormat(line.trim().to_string()))?;

    Ok(UpxResult {
        uncompressed_size: caps[1].to_string(),
        compressed_size: caps[2].to_string(),
        percent: caps[3].to_string(),
        algo: caps[4].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "                       Ultimate Packer for eXecutables
                          Copyright (C) 1996 - 2020
UPX 3.96        Markus Oberhumer, Laszlo Molnar & John Reiser   Jan 23rd 2020

        File size         Ratio      Format      Name
   --------------------   ------   -----------   -----------
   2367488 ->    950272   40.14%   linux/amd64   app-linux-amd64-upx

Packed 1 file.
";

    #[test]
    fn test_parse_real_report() {
        let res = parse_result(REPORT).unwrap();
        assert_eq!(res.uncompressed_size, "2367488");
        assert_eq!(res.compressed_size, "950272");
        assert_eq!(res.percent, "40.14%");
        assert_eq!(res.algo, "linux/amd64");
    }

    #[test]
    fn test_parse_semicolon_report() {
        let output = "l0\nl1\nl2\nl3\nl4\nl5\n12345678 -> 2345678 ; 19.01% ; NRV2B\n";
        let res = parse_result(output).unwrap();
        assert_eq!(
            res,
            UpxResult {
                uncompressed_size: "12345678".into(),
                compressed_size: "2345678".into(),
                percent: "19.01%".into(),
                algo: "NRV2B".into(),
            }
        );
    }

    #[test]
    fn test_parse_short_or_garbled_output() {
        assert!(matches!(parse_result("a\nb\nc"), Err(UpxErr::WrongFormat(_))));
        let garbled = "0\n1\n2\n3\n4\n5\nupx: app: NotCompressibleException\n";
        assert!(matches!(parse_result(garbled), Err(UpxErr::WrongFormat(_))));
    }

    #[test]
    fn test_check_version() {
        let out = "upx 4.2.1\nUCL data compression library 1.03\nzlib data compression library 1.3\n";
        assert_eq!(check_version(out).unwrap(), "4.2.1");
        assert_eq!(check_version("upx 3.95\n").unwrap(), "3.95");
        assert_eq!(check_version("upx 4.0.2-git-1a2b3c\n").unwrap(), "4.0.2-git-1a2b3c");

        match check_version("upx 3.91\nNRV data compression library 0.2\n") {
            Err(UpxErr::Unsupported { found, required }) => {
                assert_eq!(found, "3.91");
                assert_eq!(required, "3.95");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(check_version("garbage"), Err(UpxErr::WrongFormat(_))));
    }

    #[test]
    fn test_packed_path() {
        assert_eq!(
            packed_path(Path::new("dist/app-windows-amd64.exe")),
            PathBuf::from("dist/app-windows-amd64-upx.exe")
        );
        assert_eq!(
            packed_path(Path::new("dist/app-linux-arm7")),
            PathBuf::from("dist/app-linux-arm7-upx")
        );
    }

    /// Answers `--version`, records its arguments and splits the report over stdout and stderr
    #[cfg(unix)]
    const FAKE_UPX: &str = r#"printf '%s\n' "$@" > "$(dirname "$0")/upx.args"
if [ "$3" = "--version" ]; then echo "upx 4.2.1"; exit 0; fi
printf '%s\n' '                       Ultimate Packer for eXecutables' '                          Copyright (C) 1996 - 2020' 'UPX 4.2.1       Markus Oberhumer, Laszlo Molnar & John Reiser' ''
printf '%s\n' '        File size         Ratio      Format      Name' '   --------------------   ------   -----------   -----------' '   2367488 ->    950272   40.14%   linux/amd64   app-linux-amd64-upx' >&2
"#;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compress_runs_upx_and_parses_combined_output() {
        let dir = tempfile::tempdir().unwrap();
        let program = crate::tools::script(dir.path(), "upx", FAKE_UPX);
        let artifact = dir.path().join("app-linux-amd64");
        std::fs::write(&artifact, b"binary").unwrap();

        let upx = Upx::detect(&program).await;
        assert!(upx.available());
        assert_eq!(upx.version(), Some("4.2.1"));

        let res = upx.compress(&artifact, 7, false).await.unwrap();
        assert_eq!(res.uncompressed_size, "2367488");
        assert_eq!(res.compressed_size, "950272");
        assert_eq!(res.percent, "40.14%");
        assert_eq!(res.algo, "linux/amd64");

        let args = std::fs::read_to_string(dir.path().join("upx.args")).unwrap();
        let packed = dir.path().join("app-linux-amd64-upx");
        assert_eq!(
            args.lines().collect::<Vec<_>>(),
            [
                "--no-color",
                "--no-progress",
                "-7",
                "-o",
                packed.to_str().unwrap(),
                artifact.to_str().unwrap(),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compress_reports_failed_exit() {
        let dir = tempfile::tempdir().unwrap();
        let program = crate::tools::script(
            dir.path(),
            "upx",
            "if [ \"$3\" = \"--version\" ]; then echo \"upx 3.96\"; exit 0; fi\necho 'upx: NotCompressibleException' >&2\nexit 2\n",
        );

        let upx = Upx::detect(&program).await;
        assert_eq!(upx.version(), Some("3.96"));
        let err = upx.compress(&dir.path().join("app"), 9, false).await.unwrap_err();
        assert!(matches!(err, UpxErr::Failed { status } if status.code() == Some(2)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detect_rejects_old_upx() {
        let dir = tempfile::tempdir().unwrap();
        let program = crate::tools::script(dir.path(), "upx", "echo 'upx 3.91'\n");
        assert!(!Upx::detect(&program).await.available());
    }

    #[tokio::test]
    async fn test_detect_missing_binary_is_unavailable() {
        let upx = Upx::detect("/nonexistent/definitely-not-upx").await;
        assert!(!upx.available());
        assert_eq!(upx.version(), None);
    }
}

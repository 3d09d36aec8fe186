use indicatif::{ProgressBar, ProgressStyle};
use std::{borrow::Cow, io::IsTerminal, time::Duration};
use yansi::Paint;

/// Macro to print standardized solution suggestions with bullet points
///
/// Usage:
/// ```
/// suggest!("Install UPX or drop the {} flag", cmd = "--upx");
/// suggest!("Simple message without command");
/// ```
#[macro_export]
macro_rules! suggest {
    // Pattern with cmd parameter
    ($fmt:expr, cmd = $cmd:expr $(, $($args:tt)*)?) => {
        println!(
            "• {}",
            format!($fmt, $crate::tools::format_cmd($cmd) $(, $($args)*)?)
        );
    };
    // Pattern without cmd parameter
    ($fmt:expr $(, $($args:tt)*)?) => {
        println!("• {}", format!($fmt $(, $($args)*)?));
    };
}

/// Helper function to format commands with green italic styling
pub fn format_cmd(cmd: &str) -> String {
    Paint::green(cmd).italic().to_string()
}

/// Print a warning message in yellow if stderr is a TTY
#[inline]
pub fn warn(message: impl Into<Cow<'static, str>>) {
    let msg = message.into();
    eprintln!("{}: {}", "Warning".yellow().bold(), msg);
}

/// Print an error message in red if stderr is a TTY
#[inline]
pub fn error(message: impl Into<Cow<'static, str>>) {
    let msg = message.into();
    eprintln!("{}: {}", "Error".red().bold(), msg);
}

#[inline]
pub fn is_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Spinner shown while a subprocess runs. Hidden in verbose mode, where the
/// subprocess writes to the terminal itself.
pub fn spinner(verbose: bool, message: impl Into<Cow<'static, str>>) -> ProgressBar {
    if verbose || !is_tty() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("\t{spinner:.cyan} {msg} {elapsed:.dim}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Duration rounded to whole seconds: `0s`, `42s`, `1m5s`, `2h0m3s`
pub fn round_secs(d: Duration) -> String {
    let total = d.as_secs() + u64::from(d.subsec_millis() >= 500);
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m{s}s"),
        _ => format!("{h}h{m}m{s}s"),
    }
}

/// Lenient version parse: `1.13` -> 1.13.0, `4.2.1-git-abc` -> 4.2.1, `1.22rc1` -> 1.22.0
pub fn loose_version(s: &str) -> Option<semver::Version> {
    let core: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let core = core.trim_end_matches('.');

    let normalized = match core.chars().filter(|&c| c == '.').count() {
        0 => format!("{core}.0.0"),
        1 => format!("{core}.0"),
        _ => core.to_string(),
    };
    semver::Version::parse(&normalized).ok()
}

/// Write an executable shell script standing in for an external tool
#[cfg(all(test, unix))]
pub fn script(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

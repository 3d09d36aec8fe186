/// RFC 1123 layout used for the injected build date
pub const BUILD_TIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S UTC";

/// Read-only metadata shared by every build of a run
#[derive(Debug, Clone, Default)]
pub struct Meta {
    /// Build date, see [`BUILD_TIME_FORMAT`]
    pub build_time: String,
    /// `go1.21.3`
    pub go_version: String,
    /// Base name of the produced binaries
    pub name: String,
    pub upx_version: Option<String>,
    pub user_version: Option<String>,
    pub git_commit: Option<String>,
}

impl Meta {
    pub fn build_time(now: chrono::DateTime<chrono::Utc>) -> String {
        now.format(BUILD_TIME_FORMAT).to_string()
    }
}

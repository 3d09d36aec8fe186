//! Build target representation: `<os>-<arch>-<variant>`

use crate::TripletErr;
use std::{fmt, str::FromStr};

/// Cross C compiler used for `windows` targets
pub const MINGW_CC: &str = "x86_64-w64-mingw32-gcc";
/// Cross C compiler used for `linux-*-musl` targets
pub const MUSL_CC: &str = "musl-gcc";
/// Soft-float ARM compiler (profile 6 and below)
pub const ARM_GNUEABI_CC: &str = "arm-linux-gnueabi-gcc-8";
/// Hard-float ARM compiler (profile 7 and above)
pub const ARM_GNUEABIHF_CC: &str = "arm-linux-gnueabihf-gcc-8";
/// 64-bit ARM compiler
pub const AARCH64_CC: &str = "aarch64-linux-gnu-gcc-8";
/// Default linux compiler
pub const X86_64_LINUX_CC: &str = "x86_64-linux-gnu-gcc";

/// Highest ARM profile that is built with the soft-float compiler
const ARM_SOFT_FLOAT_MAX_PROFILE: i64 = 6;

/// Target operating system, named the way `GOOS` names it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Windows,
    Darwin,
    Freebsd,
    /// Any `GOOS` value without special handling, kept verbatim
    Other(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
            Platform::Darwin => "darwin",
            Platform::Freebsd => "freebsd",
            Platform::Other(s) => s,
        }
    }
}

impl From<&str> for Platform {
    fn from(s: &str) -> Self {
        match s {
            "linux" => Platform::Linux,
            "windows" => Platform::Windows,
            "darwin" => Platform::Darwin,
            "freebsd" => Platform::Freebsd,
            other => Platform::Other(other.to_string()),
        }
    }
}

/// Target architecture, named the way `GOARCH` names it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    Amd64,
    I386,
    Arm,
    Arm64,
    /// Any `GOARCH` value without special handling, kept verbatim
    Other(String),
}

impl Arch {
    pub fn as_str(&self) -> &str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::I386 => "386",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::Other(s) => s,
        }
    }
}

impl From<&str> for Arch {
    fn from(s: &str) -> Self {
        match s {
            "amd64" => Arch::Amd64,
            "386" => Arch::I386,
            "arm" => Arch::Arm,
            "arm64" => Arch::Arm64,
            other => Arch::Other(other.to_string()),
        }
    }
}

/// Third triplet component: an ARM profile (`GOARM`) or a libc flavor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    None,
    /// Build against musl libc
    Musl,
    /// Numeric architecture revision, e.g. the `7` in `linux-arm-7`
    Revision(u32),
    /// Anything else, kept verbatim
    Other(String),
}

impl Variant {
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Variant::None => "".into(),
            Variant::Musl => "musl".into(),
            Variant::Revision(n) => n.to_string().into(),
            Variant::Other(s) => s.as_str().into(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Variant::None)
    }

    pub fn is_musl(&self) -> bool {
        matches!(self, Variant::Musl)
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        match s {
            "" => Variant::None,
            "musl" => Variant::Musl,
            // "07" must stay "07", so only canonical numbers become revisions
            other => match other.parse::<u32>() {
                Ok(n) if n.to_string() == other => Variant::Revision(n),
                _ => Variant::Other(other.to_string()),
            },
        }
    }
}

/// One cross-compilation target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triplet {
    pub platform: Platform,
    pub arch: Arch,
    pub variant: Variant,
}

impl Triplet {
    pub fn new(platform: impl Into<Platform>, arch: impl Into<Arch>, variant: impl Into<Variant>) -> Self {
        Self {
            platform: platform.into(),
            arch: arch.into(),
            variant: variant.into(),
        }
    }

    /// Name of the artifact built for this target
    ///
    /// `<name>-<os>[-musl]-<arch>[<arm profile>][.exe]`, e.g. `app-linux-arm7`
    /// or `app-windows-amd64.exe`.
    pub fn filename(&self, name: &str) -> String {
        let mut f = format!("{name}-{}-", self.platform.as_str());

        if self.platform == Platform::Linux && self.variant.is_musl() {
            f.push_str("musl-");
        }

        f.push_str(self.arch.as_str());
        if self.arch == Arch::Arm {
            f.push_str(&self.variant.as_str());
        }

        if self.platform == Platform::Windows {
            f.push_str(".exe");
        }
        f
    }

    /// C cross compiler to hand to cgo via `CC`, if one is known for this target
    pub fn compiler(&self) -> Option<&'static str> {
        match self.platform {
            Platform::Windows => Some(MINGW_CC),
            Platform::Linux => Some(match (&self.arch, &self.variant) {
                (_, Variant::Musl) => MUSL_CC,
                (Arch::Arm, variant) => {
                    // "07" and "+7" are still profile 7
                    let profile = match variant {
                        Variant::Revision(n) => i64::from(*n),
                        Variant::Other(s) => s.parse::<i64>().unwrap_or(0),
                        _ => 0,
                    };
                    if profile <= ARM_SOFT_FLOAT_MAX_PROFILE {
                        ARM_GNUEABI_CC
                    } else {
                        ARM_GNUEABIHF_CC
                    }
                }
                (Arch::Arm64, _) => AARCH64_CC,
                _ => X86_64_LINUX_CC,
            }),
            _ => None,
        }
    }

    /// Three-component form that always parses back, e.g. `linux-amd64-`
    pub fn canonical(&self) -> String {
        format!(
            "{}-{}-{}",
            self.platform.as_str(),
            self.arch.as_str(),
            self.variant.as_str()
        )
    }
}

impl FromStr for Triplet {
    type Err = TripletErr;

    /// Parse `<os>-<arch>-<variant>`; the variant may be empty but its separator may not
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() < 3 {
            return Err(TripletErr::NoValidTriplet(s.to_string()));
        }
        Ok(Triplet::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.platform.as_str(), self.arch.as_str())?;
        if !self.variant.is_none() {
            write!(f, "-{}", self.variant.as_str())?;
        }
        Ok(())
    }
}

use std::fmt;

use crate::install::error::ProvisionError;

/// Operating system, named the way release artifacts name it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
    FreeBsd,
    OpenBsd,
    Solaris,
}

/// CPU architecture, named the way release artifacts name it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Amd64,
    Arm64,
    X86,
    Arm,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "windows",
            Os::FreeBsd => "freebsd",
            Os::OpenBsd => "openbsd",
            Os::Solaris => "solaris",
        }
    }

    /// Map a Rust `target_os` value
    pub fn from_rust(os: &str) -> Option<Self> {
        match os {
            "linux" => Some(Os::Linux),
            "macos" => Some(Os::Darwin),
            "windows" => Some(Os::Windows),
            "freebsd" => Some(Os::FreeBsd),
            "openbsd" => Some(Os::OpenBsd),
            "solaris" | "illumos" => Some(Os::Solaris),
            _ => None,
        }
    }
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::X86 => "386",
            Arch::Arm => "arm",
        }
    }

    /// Map a Rust `target_arch` value
    pub fn from_rust(arch: &str) -> Option<Self> {
        match arch {
            "x86_64" => Some(Arch::Amd64),
            "aarch64" => Some(Arch::Arm64),
            "x86" => Some(Arch::X86),
            "arm" => Some(Arch::Arm),
            _ => None,
        }
    }
}

/// OS/architecture pair an artifact is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The platform this process runs on
    pub fn current() -> Result<Self, ProvisionError> {
        Self::from_rust(std::env::consts::OS, std::env::consts::ARCH)
    }

    fn from_rust(os: &str, arch: &str) -> Result<Self, ProvisionError> {
        match (Os::from_rust(os), Arch::from_rust(arch)) {
            (Some(os), Some(arch)) => Ok(Self { os, arch }),
            _ => Err(ProvisionError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    /// Executable file name of `product` on this platform
    pub fn binary_name(&self, product: &str) -> String {
        match self.os {
            Os::Windows => format!("{}.exe", product),
            _ => product.to_string(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os.as_str(), self.arch.as_str())
    }
}

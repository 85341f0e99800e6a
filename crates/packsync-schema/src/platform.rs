//! Host platform detection.

/// Host operating system family, used for client-side platform filtering.
///
/// Detection never fails: a host that cannot be classified is [`Platform::Unknown`],
/// which disables platform filtering for the whole run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Microsoft Windows
    Windows,
    /// Apple macOS
    Macos,
    /// Linux and other Unix-likes
    Linux,
    /// Could not be determined
    #[default]
    Unknown,
}

impl Platform {
    /// Detect the platform this process is running on.
    ///
    /// Call once at startup and pass the value to whatever needs it.
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Classify an OS name string (e.g. `"Windows 11"`, `"darwin"`, `"linux"`).
    ///
    /// Matching is by lowercase substring. macOS is tested first since
    /// `"darwin"` contains `"win"`.
    pub fn from_os_name(name: &str) -> Self {
        let n = name.to_lowercase();
        if n.contains("mac") || n.contains("darwin") {
            Self::Macos
        } else if n.contains("win") {
            Self::Windows
        } else if n.contains("nux") || n.contains("nix") {
            Self::Linux
        } else {
            Self::Unknown
        }
    }

    /// Returns `true` unless this is [`Platform::Unknown`].
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Linux => "linux",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::Macos),
            "linux" => Ok(Self::Linux),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown platform: {s}")),
        }
    }
}

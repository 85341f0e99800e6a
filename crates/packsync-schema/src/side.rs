//! Client/server side classification.

/// Which kind of installation a piece of content applies to.
///
/// A pack is installed either as a client or as a server. Files declare the
/// side they require; `Both` means the file is needed everywhere.
///
/// # Example
///
/// ```
/// use packsync_schema::Side;
///
/// assert!(Side::Both.has_side(Side::Server));
/// assert!(!Side::Client.has_side(Side::Server));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Client installations only.
    Client,
    /// Server installations only.
    Server,
    /// Needed on both sides (default).
    #[default]
    Both,
}

impl Side {
    /// Returns `true` if an installation targeting `self` includes `required`.
    ///
    /// `Both` on either side always matches; otherwise the sides must be equal.
    pub fn has_side(self, required: Side) -> bool {
        self == Side::Both || required == Side::Both || self == required
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
            Self::Both => "both",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "server" => Ok(Self::Server),
            "both" => Ok(Self::Both),
            _ => Err(format!("Unknown side: {s}")),
        }
    }
}

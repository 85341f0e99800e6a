/// Terminal outcome of reconciling one declared file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompletionStatus {
    /// No terminal outcome reached (still running, failed, or preserved).
    Incomplete,
    /// Fetched, verified and written.
    Downloaded,
    /// Fetched for a server even though the file excludes this platform.
    DownloadedIgnoringPlatformFilter,
    /// The cache record already matched the index.
    AlreadyPresentCached,
    /// The file on disk already matched its expected hash.
    AlreadyPresentValidated,
    /// Optional and deselected; nothing was on disk.
    SkippedDisabled,
    /// Belongs to the other side; nothing was on disk.
    SkippedWrongSide,
    /// Excluded on this platform; nothing was on disk.
    SkippedWrongPlatform,
    /// Optional and deselected; the previous copy was removed.
    DeletedDisabled,
    /// Belongs to the other side; the previous copy was removed.
    DeletedWrongSide,
    /// Excluded on this platform; the previous copy was removed.
    DeletedWrongPlatform,
}

impl CompletionStatus {
    /// All statuses, in report order.
    pub const ALL: [CompletionStatus; 11] = [
        Self::Incomplete,
        Self::Downloaded,
        Self::DownloadedIgnoringPlatformFilter,
        Self::AlreadyPresentCached,
        Self::AlreadyPresentValidated,
        Self::SkippedDisabled,
        Self::SkippedWrongSide,
        Self::SkippedWrongPlatform,
        Self::DeletedDisabled,
        Self::DeletedWrongSide,
        Self::DeletedWrongPlatform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Downloaded => "downloaded",
            Self::DownloadedIgnoringPlatformFilter => "downloaded_ignoring_platform_filter",
            Self::AlreadyPresentCached => "already_present_cached",
            Self::AlreadyPresentValidated => "already_present_validated",
            Self::SkippedDisabled => "skipped_disabled",
            Self::SkippedWrongSide => "skipped_wrong_side",
            Self::SkippedWrongPlatform => "skipped_wrong_platform",
            Self::DeletedDisabled => "deleted_disabled",
            Self::DeletedWrongSide => "deleted_wrong_side",
            Self::DeletedWrongPlatform => "deleted_wrong_platform",
        }
    }

    /// Human wording for summaries ("3 files downloaded").
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Downloaded => "downloaded",
            Self::DownloadedIgnoringPlatformFilter => "downloaded (platform filter ignored)",
            Self::AlreadyPresentCached => "already present (cached)",
            Self::AlreadyPresentValidated => "already present (validated)",
            Self::SkippedDisabled => "skipped (disabled)",
            Self::SkippedWrongSide => "skipped (wrong side)",
            Self::SkippedWrongPlatform => "skipped (wrong platform)",
            Self::DeletedDisabled => "deleted (disabled)",
            Self::DeletedWrongSide => "deleted (wrong side)",
            Self::DeletedWrongPlatform => "deleted (wrong platform)",
        }
    }
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a file is being left out of the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    WrongSide,
    WrongPlatform,
}

impl SkipReason {
    /// Status when a previously installed copy was removed.
    pub fn deleted(self) -> CompletionStatus {
        match self {
            Self::Disabled => CompletionStatus::DeletedDisabled,
            Self::WrongSide => CompletionStatus::DeletedWrongSide,
            Self::WrongPlatform => CompletionStatus::DeletedWrongPlatform,
        }
    }

    /// Status when there was nothing to remove.
    pub fn skipped(self) -> CompletionStatus {
        match self {
            Self::Disabled => CompletionStatus::SkippedDisabled,
            Self::WrongSide => CompletionStatus::SkippedWrongSide,
            Self::WrongPlatform => CompletionStatus::SkippedWrongPlatform,
        }
    }
}

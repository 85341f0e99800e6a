//! The inclusion decision.
//!
//! Pure function of the target side, the detected platform, and three
//! applicability flags. Deleting anything is the caller's business.

use packsync_schema::{Platform, Side};

use super::status::{CompletionStatus, SkipReason};

/// Applicability of one file to this installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Applicability {
    /// The file's side requirement excludes the target side.
    pub wrong_side: bool,
    /// The file excludes the detected platform.
    pub wrong_platform: bool,
    /// The file is optional and currently deselected.
    pub disabled: bool,
}

/// Outcome of the inclusion decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Go on to fetch-and-verify, optionally overriding the final status.
    Proceed(Option<CompletionStatus>),
    /// Leave the file out and remove any previously installed copy.
    Skip(SkipReason),
}

/// Decide whether a file belongs in this installation.
///
/// Servers are never platform filtered: a platform exclusion only changes the
/// reported status. Clients check platform, then side, then selection. An
/// unknown platform turns platform filtering off.
pub fn evaluate(target: Side, platform: Platform, flags: Applicability) -> Verdict {
    if target.has_side(Side::Server) {
        if flags.wrong_side {
            return Verdict::Skip(SkipReason::WrongSide);
        }
        if flags.disabled {
            return Verdict::Skip(SkipReason::Disabled);
        }
        if flags.wrong_platform && platform.is_known() {
            return Verdict::Proceed(Some(CompletionStatus::DownloadedIgnoringPlatformFilter));
        }
        return Verdict::Proceed(None);
    }

    let wrong_platform = if platform.is_known() {
        flags.wrong_platform
    } else {
        if flags.wrong_platform {
            tracing::warn!("Couldn't determine platform, ignoring platform filtering");
        }
        false
    };

    if wrong_platform {
        return Verdict::Skip(SkipReason::WrongPlatform);
    }
    if flags.wrong_side {
        return Verdict::Skip(SkipReason::WrongSide);
    }
    if flags.disabled {
        return Verdict::Skip(SkipReason::Disabled);
    }
    Verdict::Proceed(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(wrong_side: bool, wrong_platform: bool, disabled: bool) -> Applicability {
        Applicability {
            wrong_side,
            wrong_platform,
            disabled,
        }
    }

    /// Expected verdict for every combination, written out by hand.
    fn expected(target: Side, platform: Platform, f: Applicability) -> Verdict {
        use SkipReason::*;
        use Verdict::*;
        let server = target != Side::Client;
        match (server, platform.is_known(), f.wrong_side, f.wrong_platform, f.disabled) {
            // servers: side, then disabled, then platform only tags the status
            (true, _, true, _, _) => Skip(WrongSide),
            (true, _, false, _, true) => Skip(Disabled),
            (true, true, false, true, false) => {
                Proceed(Some(CompletionStatus::DownloadedIgnoringPlatformFilter))
            }
            (true, _, false, _, false) => Proceed(None),
            // clients: platform (if known), side, disabled
            (false, true, _, true, _) => Skip(WrongPlatform),
            (false, _, true, _, _) => Skip(WrongSide),
            (false, _, false, _, true) => Skip(Disabled),
            (false, _, false, _, false) => Proceed(None),
        }
    }

    #[test]
    fn full_truth_table() {
        let sides = [Side::Client, Side::Server, Side::Both];
        let platforms = [Platform::Linux, Platform::Windows, Platform::Unknown];
        for target in sides {
            for platform in platforms {
                for bits in 0u8..8 {
                    let f = flags(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
                    assert_eq!(
                        evaluate(target, platform, f),
                        expected(target, platform, f),
                        "target={target} platform={platform} flags={f:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn server_ignores_platform_exclusion() {
        assert_eq!(
            evaluate(Side::Server, Platform::Macos, flags(false, true, false)),
            Verdict::Proceed(Some(CompletionStatus::DownloadedIgnoringPlatformFilter))
        );
    }

    #[test]
    fn client_platform_checked_before_side() {
        assert_eq!(
            evaluate(Side::Client, Platform::Linux, flags(true, true, true)),
            Verdict::Skip(SkipReason::WrongPlatform)
        );
    }

    #[test]
    fn unknown_platform_still_honours_side_and_selection() {
        assert_eq!(
            evaluate(Side::Client, Platform::Unknown, flags(false, true, false)),
            Verdict::Proceed(None)
        );
        assert_eq!(
            evaluate(Side::Client, Platform::Unknown, flags(true, true, false)),
            Verdict::Skip(SkipReason::WrongSide)
        );
        assert_eq!(
            evaluate(Side::Client, Platform::Unknown, flags(false, false, true)),
            Verdict::Skip(SkipReason::Disabled)
        );
    }
}

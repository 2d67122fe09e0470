//! Block / restriction detection from platform response signals.
//!
//! Stateless inspector run after every network interaction. The page
//! body and final URL are checked against known indicator patterns and
//! classified into a tri-state verdict the dispatcher acts on uniformly.

use serde::Serialize;

/// Classification of one response signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Nothing suspicious; proceed normally.
    Normal,
    /// Caution indicator (e.g. near-limit warning). Logged; pacing may
    /// widen, execution continues.
    SoftWarning,
    /// Hard block indicator. Fatal for the current run.
    Blocked,
}

/// Result of classifying one response.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub verdict: Verdict,
    /// The pattern that matched, for logging and attempt records.
    pub matched: Option<String>,
}

impl Detection {
    pub fn normal() -> Self {
        Self {
            verdict: Verdict::Normal,
            matched: None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.verdict == Verdict::Blocked
    }

    /// The matched pattern, or a placeholder for clean responses.
    pub fn marker(&self) -> &str {
        self.matched.as_deref().unwrap_or("none")
    }
}

/// URL fragments that indicate an interstitial challenge or auth wall.
const BLOCKED_URL_PATTERNS: &[&str] = &["/checkpoint/challenge", "/authwall"];

/// Whether a block marker means the session itself no longer
/// authenticates. An auth-wall redirect requires a fresh login; a
/// challenge or limit block leaves the session usable after review.
pub fn is_auth_loss(marker: &str) -> bool {
    marker.contains("/authwall")
}

/// Body indicators of a hard block. Matched against the lowercased body;
/// the platform serves localized texts, so known variants are listed.
const BLOCKED_BODY_PATTERNS: &[&str] = &[
    "you've reached the weekly invitation limit",
    "has alcanzado el límite semanal de invitaciones",
    "your account has been restricted",
    "hemos restringido tu cuenta",
    "we've noticed unusual activity",
    "data-test-icon='locked'",
];

/// Body indicators of a near-limit warning. Checked only after the
/// blocked patterns, so a true-limit modal is never downgraded.
const SOFT_BODY_PATTERNS: &[&str] = &[
    "you're close to the weekly invitation limit",
    "estás cerca del límite semanal de invitaciones",
    "ip-fuse-limit-alert",
];

/// Classify a response by its final URL and body.
///
/// First matching pattern wins; blocked patterns take precedence over
/// soft warnings.
pub fn classify(url: &str, body: &str) -> Detection {
    for pattern in BLOCKED_URL_PATTERNS {
        if url.contains(pattern) {
            return Detection {
                verdict: Verdict::Blocked,
                matched: Some(pattern.to_string()),
            };
        }
    }

    let body_lower = body.to_lowercase();

    for pattern in BLOCKED_BODY_PATTERNS {
        if body_lower.contains(pattern) {
            return Detection {
                verdict: Verdict::Blocked,
                matched: Some(pattern.to_string()),
            };
        }
    }

    for pattern in SOFT_BODY_PATTERNS {
        if body_lower.contains(pattern) {
            return Detection {
                verdict: Verdict::SoftWarning,
                matched: Some(pattern.to_string()),
            };
        }
    }

    Detection::normal()
}

//! Exclusion policy: who must never be invited automatically.

use std::collections::HashSet;

use crate::{ExclusionReason, Login};

/// Accounts excluded when no explicit list is configured.
pub const KNOWN_BOT_EXCLUSIONS: [&str; 4] = [
    "dependabot-preview[bot]",
    "dependabot-preview",
    "dependabot",
    "dependabot[bot]",
];

/// Configured exclusion list plus bot handling.
///
/// Matching is case-insensitive, following GitHub's login semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    users: HashSet<String>,
    skip_bots: bool,
}

impl ExclusionPolicy {
    /// Builds a policy from an explicit list of logins.
    pub fn new<I, S>(users: I, skip_bots: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            users: users
                .into_iter()
                .map(|u| u.as_ref().trim().to_ascii_lowercase())
                .filter(|u| !u.is_empty())
                .collect(),
            skip_bots,
        }
    }

    /// A policy that excludes nobody.
    pub fn none() -> Self {
        Self::new(std::iter::empty::<&str>(), false)
    }

    /// Returns the exclusion rule matching `login`, if any.
    ///
    /// An explicit list entry is reported in preference to the bot rule.
    pub fn classify(&self, login: &Login) -> Option<ExclusionReason> {
        if self.users.contains(&login.normalized()) {
            Some(ExclusionReason::Listed)
        } else if self.skip_bots && login.is_bot() {
            Some(ExclusionReason::Bot)
        } else {
            None
        }
    }

    /// Number of explicitly listed logins.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::new(KNOWN_BOT_EXCLUSIONS, true)
    }
}

//! Contributor sets and commit-trailer parsing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::Login;

const CO_AUTHOR_TRAILER: &str = "Co-authored-by:";

/// Ordered, de-duplicated contributors of one release.
///
/// Iteration order is insertion order. Logins are compared case-insensitively
/// and the first spelling of a login wins. Reconciliation results are
/// reported in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Login>", into = "Vec<Login>")]
pub struct ContributorSet {
    logins: Vec<Login>,
    seen: HashSet<String>,
}

impl ContributorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `login`, returning `false` if it was already present in any casing.
    pub fn insert(&mut self, login: Login) -> bool {
        if !self.seen.insert(login.normalized()) {
            return false;
        }
        self.logins.push(login);
        true
    }

    pub fn contains(&self, login: &Login) -> bool {
        self.seen.contains(&login.normalized())
    }

    pub fn len(&self) -> usize {
        self.logins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logins.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Login> {
        self.logins.iter()
    }

    pub fn as_slice(&self) -> &[Login] {
        &self.logins
    }

    /// Returns a copy sorted case-insensitively by login.
    #[must_use]
    pub fn sorted(&self) -> Self {
        let mut logins = self.logins.clone();
        logins.sort_by_cached_key(Login::normalized);
        Self {
            logins,
            seen: self.seen.clone(),
        }
    }
}

impl FromIterator<Login> for ContributorSet {
    fn from_iter<I: IntoIterator<Item = Login>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Login> for ContributorSet {
    fn extend<I: IntoIterator<Item = Login>>(&mut self, iter: I) {
        for login in iter {
            self.insert(login);
        }
    }
}

impl IntoIterator for ContributorSet {
    type Item = Login;
    type IntoIter = std::vec::IntoIter<Login>;

    fn into_iter(self) -> Self::IntoIter {
        self.logins.into_iter()
    }
}

impl<'a> IntoIterator for &'a ContributorSet {
    type Item = &'a Login;
    type IntoIter = std::slice::Iter<'a, Login>;

    fn into_iter(self) -> Self::IntoIter {
        self.logins.iter()
    }
}

impl From<Vec<Login>> for ContributorSet {
    fn from(logins: Vec<Login>) -> Self {
        logins.into_iter().collect()
    }
}

impl From<ContributorSet> for Vec<Login> {
    fn from(set: ContributorSet) -> Self {
        set.logins
    }
}

/// Extracts co-author logins from `Co-authored-by:` trailers in a commit message.
///
/// The login is the first whitespace-separated token of the trailer value,
/// with a leading `@` removed. `Co-authored-by: Jane <jane@example.com>`
/// therefore yields `Jane`.
pub fn parse_co_authors(message: &str) -> Vec<Login> {
    message
        .lines()
        .filter_map(|line| line.strip_prefix(CO_AUTHOR_TRAILER))
        .filter_map(|value| value.split_whitespace().next())
        .filter_map(|token| Login::new(token.trim_start_matches('@')))
        .collect()
}

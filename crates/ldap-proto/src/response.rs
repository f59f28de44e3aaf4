//! Directory response types.

use std::collections::BTreeMap;

use crate::request::Control;

/// One entry returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchEntry {
    /// Entry DN.
    pub dn: String,
    /// Attribute values keyed by attribute name.
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl SearchEntry {
    /// First value of an attribute, if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .get(attribute)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
    /// Matching entries.
    pub entries: Vec<SearchEntry>,
    /// Continuation references.
    pub referrals: Vec<String>,
    /// Response controls.
    pub controls: Vec<Control>,
}

/// Result of a modify that asked for response controls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifyResult {
    /// Response controls.
    pub controls: Vec<Control>,
}

/// Result of a password modify.
#[derive(Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PasswordModifyResult {
    /// Password generated by the server, when none was supplied.
    pub generated_password: Option<String>,
    /// Response controls.
    pub controls: Vec<Control>,
}

impl std::fmt::Debug for PasswordModifyResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordModifyResult")
            .field(
                "generated_password",
                &self.generated_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("controls", &self.controls)
            .finish()
    }
}

/// What a directory client hands back for an [`Operation`](crate::Operation).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Response {
    /// Entries from a search or paged search.
    Search(SearchResult),
    /// Success with no payload (add, modify, modify-DN, delete).
    Done,
    /// Success of a modify that asked for response controls.
    Modified(ModifyResult),
    /// Success of a password modify.
    PasswordModified(PasswordModifyResult),
}

impl Response {
    /// Short label for logging and error reporting.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Search(_) => "search",
            Self::Done => "done",
            Self::Modified(_) => "modified",
            Self::PasswordModified(_) => "password_modified",
        }
    }
}

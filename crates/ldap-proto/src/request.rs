//! Directory request types.
//!
//! Requests are plain data. Encoding them onto the wire is the directory
//! client's concern.

use std::collections::BTreeMap;

/// Attribute selector that asks the server to return no attributes.
pub const NO_ATTRIBUTES: &str = "1.1";

/// Search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchScope {
    /// Only the base entry itself.
    BaseObject,
    /// Immediate children of the base entry.
    SingleLevel,
    /// The base entry and its whole subtree.
    #[default]
    WholeSubtree,
}

/// Alias dereferencing policy for searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DerefAliases {
    /// Never dereference aliases.
    #[default]
    Never,
    /// Dereference while searching below the base.
    InSearching,
    /// Dereference when locating the base object.
    FindingBaseObject,
    /// Always dereference.
    Always,
}

/// A request or response control.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Control {
    /// Control OID.
    pub oid: String,
    /// Whether the server must reject the operation if it does not support
    /// the control.
    pub criticality: bool,
    /// Encoded control value.
    pub value: Option<Vec<u8>>,
}

impl Control {
    /// Create a non-critical control without a value.
    pub fn new(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            criticality: false,
            value: None,
        }
    }
}

/// Search request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchRequest {
    /// Base DN of the search.
    pub base_dn: String,
    /// Search scope.
    pub scope: SearchScope,
    /// Alias dereferencing policy.
    pub deref_aliases: DerefAliases,
    /// Maximum number of entries to return (0 = unlimited).
    pub size_limit: u32,
    /// Server-side time limit in seconds (0 = unlimited).
    pub time_limit: u32,
    /// Return attribute names only.
    pub types_only: bool,
    /// Search filter in string form.
    pub filter: String,
    /// Attributes to return.
    pub attributes: Vec<String>,
    /// Request controls.
    pub controls: Vec<Control>,
}

impl SearchRequest {
    /// Create a subtree search with default limits.
    pub fn new(base_dn: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
            scope: SearchScope::default(),
            deref_aliases: DerefAliases::default(),
            size_limit: 0,
            time_limit: 0,
            types_only: false,
            filter: filter.into(),
            attributes: Vec::new(),
            controls: Vec::new(),
        }
    }

    /// The liveness probe: a base-scope read of the root DSE that returns no
    /// attributes.
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::new("", "(objectClass=*)")
            .scope(SearchScope::BaseObject)
            .size_limit(1)
            .attributes([NO_ATTRIBUTES])
    }

    /// Whether this request is the liveness probe built by
    /// [`heartbeat`](Self::heartbeat).
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        *self == Self::heartbeat()
    }

    /// Set the search scope.
    #[must_use]
    pub fn scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the alias dereferencing policy.
    #[must_use]
    pub fn deref_aliases(mut self, deref: DerefAliases) -> Self {
        self.deref_aliases = deref;
        self
    }

    /// Set the size limit.
    #[must_use]
    pub fn size_limit(mut self, limit: u32) -> Self {
        self.size_limit = limit;
        self
    }

    /// Set the time limit in seconds.
    #[must_use]
    pub fn time_limit(mut self, seconds: u32) -> Self {
        self.time_limit = seconds;
        self
    }

    /// Only return attribute names.
    #[must_use]
    pub fn types_only(mut self, types_only: bool) -> Self {
        self.types_only = types_only;
        self
    }

    /// Set the attributes to return.
    #[must_use]
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a request control.
    #[must_use]
    pub fn control(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }
}

/// Add request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddRequest {
    /// DN of the new entry.
    pub dn: String,
    /// Attributes of the new entry.
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Request controls.
    pub controls: Vec<Control>,
}

impl AddRequest {
    /// Create an add request with no attributes.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
            controls: Vec::new(),
        }
    }

    /// Add an attribute with its values.
    #[must_use]
    pub fn attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }
}

/// Kind of change applied by a [`Modification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModOp {
    /// Add values.
    Add,
    /// Delete values (all values when the list is empty).
    Delete,
    /// Replace all values.
    Replace,
    /// Increment a numeric value.
    Increment,
}

/// A single attribute change.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modification {
    /// Kind of change.
    pub op: ModOp,
    /// Attribute name.
    pub attribute: String,
    /// Values involved in the change.
    pub values: Vec<String>,
}

/// Modify request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifyRequest {
    /// DN of the entry to modify.
    pub dn: String,
    /// Changes, applied in order.
    pub changes: Vec<Modification>,
    /// Request controls.
    pub controls: Vec<Control>,
}

impl ModifyRequest {
    /// Create a modify request with no changes.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            changes: Vec::new(),
            controls: Vec::new(),
        }
    }

    fn change<I, S>(mut self, op: ModOp, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changes.push(Modification {
            op,
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Queue an add of values.
    #[must_use]
    pub fn add<I, S>(self, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.change(ModOp::Add, attribute, values)
    }

    /// Queue a delete of values.
    #[must_use]
    pub fn delete<I, S>(self, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.change(ModOp::Delete, attribute, values)
    }

    /// Queue a replace of all values.
    #[must_use]
    pub fn replace<I, S>(self, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.change(ModOp::Replace, attribute, values)
    }
}

/// Modify-DN (rename / move) request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifyDnRequest {
    /// Current DN of the entry.
    pub dn: String,
    /// New relative DN.
    pub new_rdn: String,
    /// Remove the old RDN value from the entry.
    pub delete_old_rdn: bool,
    /// New parent, when moving the entry.
    pub new_superior: Option<String>,
}

impl ModifyDnRequest {
    /// Rename an entry in place.
    pub fn new(dn: impl Into<String>, new_rdn: impl Into<String>, delete_old_rdn: bool) -> Self {
        Self {
            dn: dn.into(),
            new_rdn: new_rdn.into(),
            delete_old_rdn,
            new_superior: None,
        }
    }

    /// Move the entry under a new parent.
    #[must_use]
    pub fn new_superior(mut self, parent: impl Into<String>) -> Self {
        self.new_superior = Some(parent.into());
        self
    }
}

/// Delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeleteRequest {
    /// DN of the entry to delete.
    pub dn: String,
    /// Request controls.
    pub controls: Vec<Control>,
}

impl DeleteRequest {
    /// Create a delete request.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            controls: Vec::new(),
        }
    }
}

/// Password modify extended request.
#[derive(Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PasswordModifyRequest {
    /// Identity whose password changes; the bound identity when `None`.
    pub user_identity: Option<String>,
    /// Current password.
    pub old_password: Option<String>,
    /// New password; the server generates one when `None`.
    pub new_password: Option<String>,
}

impl std::fmt::Debug for PasswordModifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |p: &Option<String>| p.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("PasswordModifyRequest")
            .field("user_identity", &self.user_identity)
            .field("old_password", &redact(&self.old_password))
            .field("new_password", &redact(&self.new_password))
            .finish()
    }
}

/// A single directory operation carried by a pooled connection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Operation {
    /// Search.
    Search(SearchRequest),
    /// Search driven through the simple paged results control.
    SearchWithPaging {
        /// The search to run.
        request: SearchRequest,
        /// Entries per page.
        page_size: u32,
    },
    /// Add an entry.
    Add(AddRequest),
    /// Modify an entry.
    Modify(ModifyRequest),
    /// Modify an entry and return the response controls.
    ModifyWithResult(ModifyRequest),
    /// Rename or move an entry.
    ModifyDn(ModifyDnRequest),
    /// Delete an entry.
    Delete(DeleteRequest),
    /// Change a password.
    PasswordModify(PasswordModifyRequest),
}

impl Operation {
    /// Short label for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Search(_) => "search",
            Self::SearchWithPaging { .. } => "search_with_paging",
            Self::Add(_) => "add",
            Self::Modify(_) => "modify",
            Self::ModifyWithResult(_) => "modify_with_result",
            Self::ModifyDn(_) => "modify_dn",
            Self::Delete(_) => "delete",
            Self::PasswordModify(_) => "password_modify",
        }
    }

    /// Whether this operation is the liveness probe.
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Self::Search(request) if request.is_heartbeat())
    }
}

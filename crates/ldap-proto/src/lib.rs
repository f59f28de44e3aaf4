//! # ldap-proto
//!
//! Directory operation data model and client traits for `ldap-pool`.
//!
//! This crate does not speak any wire protocol. It describes the requests a
//! pooled directory connection can carry, the responses it hands back, and
//! the two seams a directory client library plugs into:
//!
//! - [`Connector`]: opens a transport connection to an address.
//! - [`DirectoryClient`]: one live connection that can authenticate, report
//!   whether it is closing, run an [`Operation`] and close itself.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ldap_proto::{Operation, SearchRequest, SearchScope};
//!
//! let request = SearchRequest::new("ou=people,dc=example,dc=org", "(uid=jdoe)")
//!     .scope(SearchScope::SingleLevel)
//!     .attributes(["cn", "mail"]);
//!
//! let response = client.invoke(Operation::Search(request)).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod credentials;
pub mod error;
pub mod request;
pub mod response;

pub use client::{Connector, DirectoryClient};
pub use credentials::BindCredentials;
pub use error::{ClientError, Result};
pub use request::{
    AddRequest, Control, DeleteRequest, DerefAliases, ModOp, Modification, ModifyDnRequest,
    ModifyRequest, Operation, PasswordModifyRequest, SearchRequest, SearchScope,
};
pub use response::{ModifyResult, PasswordModifyResult, Response, SearchEntry, SearchResult};

//! Bind credentials.

/// Simple bind credentials used to authenticate every pooled connection.
///
/// The password never appears in `Debug` output. With the `zeroize`
/// feature enabled, both fields are wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize, zeroize::ZeroizeOnDrop))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BindCredentials {
    username: String,
    password: String,
}

impl BindCredentials {
    /// Create credentials from a bind DN (or user name) and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The bind DN or user name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The bind password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for BindCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

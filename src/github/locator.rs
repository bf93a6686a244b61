//! Identity wrappers for owners, repositories, and tokens.

use super::error::SyncError;

/// Owner (user or organisation) login wrapper to avoid stringly typed
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerLogin(String);

impl OwnerLogin {
    /// Validates that the login is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidName`] when the supplied string is blank.
    pub fn new(value: impl AsRef<str>) -> Result<Self, SyncError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SyncError::InvalidName("owner login is empty".to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the login value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for OwnerLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoName(String);

impl RepoName {
    /// Validates that the repository name is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidName`] when the supplied string is blank.
    pub fn new(value: impl AsRef<str>) -> Result<Self, SyncError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SyncError::InvalidName(
                "repository name is empty".to_owned(),
            ));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for RepoName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingToken`] when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, SyncError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SyncError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for ApiToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

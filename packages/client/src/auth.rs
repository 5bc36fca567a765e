//! Access-token supply for hub connections.
//!
//! Tokens are fetched once per connection attempt, never per message. The
//! client refuses to dial a hub when no token is available.

#[cfg(test)]
use mockall::automock;

/// Supplies the access token used when establishing a hub connection.
#[cfg_attr(test, automock)]
pub trait TokenProvider: Send + Sync {
    /// The current access token, or `None` when the user is not signed in.
    fn token(&self) -> Option<String>;

    /// Whether a usable token is currently available.
    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Token provider backed by a fixed token, for CLI use and tests.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    /// Provider that always returns the given token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Provider for an unauthenticated user (no token).
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

//! Identities and the administrator allow-list

use serde::{Deserialize, Serialize};

/// An authenticated participant as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id (document key in `players`)
    pub id: String,
    /// Human readable name, if the provider supplied one
    pub display_name: Option<String>,
    /// Email used for administrator checks
    pub email: Option<String>,
}

impl Identity {
    /// Create an identity with only an id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: None,
        }
    }

    /// Set display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Display name, or `fallback` when missing or blank
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => fallback,
        }
    }
}

/// Decides which identities may curate the catalog and validation state
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    emails: Vec<String>,
}

impl AdminPolicy {
    /// Build from an allow-list of emails
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut emails: Vec<String> = emails
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        emails.sort();
        emails.dedup();
        Self { emails }
    }

    /// Check a single email against the allow-list
    pub fn is_administrator(&self, email: &str) -> bool {
        let email = normalize_email(email);
        !email.is_empty() && self.emails.binary_search(&email).is_ok()
    }

    /// Check an identity (identities without email are never administrators)
    pub fn is_admin_identity(&self, identity: &Identity) -> bool {
        identity
            .email
            .as_deref()
            .is_some_and(|e| self.is_administrator(e))
    }

    /// Number of allow-listed emails
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    /// Check if nobody is an administrator
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_policy_case_insensitive() {
        let policy = AdminPolicy::new(["Host@Example.com ", "other@example.com"]);
        assert_eq!(policy.len(), 2);
        assert!(policy.is_administrator("host@example.com"));
        assert!(policy.is_administrator("  HOST@EXAMPLE.COM"));
        assert!(!policy.is_administrator("guest@example.com"));
        assert!(!policy.is_administrator(""));
    }

    #[test]
    fn test_identity_without_email_is_not_admin() {
        let policy = AdminPolicy::new(["host@example.com"]);
        let anon = Identity::new("u1");
        assert!(!policy.is_admin_identity(&anon));
        assert!(policy.is_admin_identity(&anon.with_email("host@example.com")));
    }

    #[test]
    fn test_name_fallback() {
        let id = Identity::new("u1");
        assert_eq!(id.name_or("Anonymous player"), "Anonymous player");
        let id = id.with_display_name("   ");
        assert_eq!(id.name_or("Anonymous player"), "Anonymous player");
        let id = Identity::new("u2").with_display_name("Bob");
        assert_eq!(id.name_or("Anonymous player"), "Bob");
    }
}

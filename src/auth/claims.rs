use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// User roles (e.g. "seeker", "recruiter", "admin")
    #[serde(default)]
    pub roles: Vec<String>,
    /// Additional custom claims
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_default_to_empty() {
        let json = r#"{"sub":"user-1","exp":1893456000,"iat":1893452400}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.user_id(), "user-1");
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn test_extra_claims_captured() {
        let json = r#"{"sub":"user-1","exp":1893456000,"iat":1893452400,"roles":["recruiter"],"org":"acme"}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert!(claims.has_role("recruiter"));
        assert!(!claims.has_role("admin"));
        assert_eq!(claims.extra.get("org").and_then(|v| v.as_str()), Some("acme"));
    }
}

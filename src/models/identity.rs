use serde::{Deserialize, Serialize};

/// Minimal authenticated user record returned by `GET /api/me/`.
///
/// A non-zero `id` is what the service uses to signal a live account;
/// everything else is display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Identity {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub username: Option<String>,
}

impl Identity {
    /// Display name: "First Last", falling back to the email address.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let mut identity = Identity {
            id: 7,
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: "ada@example.com".to_string(),
            username: None,
        };
        assert_eq!(identity.display_name(), "Ada Lovelace");

        identity.last_name = None;
        assert_eq!(identity.display_name(), "Ada");

        identity.first_name = None;
        assert_eq!(identity.display_name(), "ada@example.com");
    }

    #[test]
    fn test_parse_me_response() {
        let json = r#"{"id": 42, "first_name": "Grace", "last_name": "Hopper",
                       "email": "grace@example.com", "username": "grace@example.com"}"#;
        let identity: Identity = serde_json::from_str(json).expect("Failed to parse identity");
        assert_eq!(identity.id, 42);
        assert_eq!(identity.username.as_deref(), Some("grace@example.com"));
    }
}

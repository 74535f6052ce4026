use crate::models::{Identity, Profile};

/// In-memory session state for the running client.
///
/// Created empty at startup and populated by a successful credential
/// exchange or by restoring a persisted access token. `clear()` wipes
/// everything and bumps the generation counter; async completions that
/// captured an older generation must discard their results instead of
/// applying them (this is how a logout beats an in-flight refresh).
#[derive(Debug, Default)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub authenticated: bool,
    pub last_error: Option<String>,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation. Capture this before suspending at a network
    /// call and check it with `is_current` before applying the result.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Wipe all session state. Invalidates every in-flight operation
    /// that captured an earlier generation.
    pub fn clear(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.identity = None;
        self.profile = None;
        self.authenticated = false;
        self.last_error = None;
        self.generation += 1;
    }

    /// Mark the session authenticated with the given identity.
    /// The access token must already be set.
    pub fn set_identity(&mut self, identity: Identity) {
        debug_assert!(self.access_token.is_some());
        self.identity = Some(identity);
        self.authenticated = true;
    }

    pub fn take_last_error(&mut self) -> Option<String> {
        self.last_error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_identity() -> Identity {
        Identity {
            id: 1,
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: "ada@example.com".to_string(),
            username: None,
        }
    }

    #[test]
    fn test_authenticated_implies_identity() {
        let mut session = Session::new();
        assert!(!session.authenticated);

        session.access_token = Some("acc".to_string());
        session.set_identity(test_identity());
        assert!(session.authenticated);
        assert!(session.identity.is_some());
        assert!(session.access_token.is_some());

        session.clear();
        assert!(!session.authenticated);
        assert!(session.identity.is_none());
        assert!(session.access_token.is_none());
    }

    #[test]
    fn test_clear_bumps_generation() {
        let mut session = Session::new();
        let before = session.generation();
        assert!(session.is_current(before));

        session.clear();
        assert!(!session.is_current(before));
        assert!(session.is_current(session.generation()));
    }

    #[test]
    fn test_take_last_error() {
        let mut session = Session::new();
        session.last_error = Some("Invalid credentials".to_string());
        assert_eq!(
            session.take_last_error().as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(session.take_last_error(), None);
    }
}

//! Single-admin gate for the content editor
//!
//! A configured username/password pair and a boolean flag. Nothing is
//! persisted and there are no roles: either the editor is unlocked or not.

/// Credentials the editor accepts
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AdminGate {
    credentials: Option<AdminCredentials>,
    authenticated: bool,
}

impl AdminGate {
    /// A gate with no configured credentials never unlocks
    pub fn new(credentials: Option<AdminCredentials>) -> Self {
        Self { credentials, authenticated: false }
    }

    /// Unlock if the pair matches. A failed attempt locks the gate again.
    pub fn login(&mut self, username: &str, password: &str) -> bool {
        self.authenticated = match &self.credentials {
            Some(c) => c.username == username && c.password == password,
            None => false,
        };
        self.authenticated
    }

    pub fn logout(&mut self) {
        self.authenticated = false;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AdminGate {
        AdminGate::new(Some(AdminCredentials {
            username: "admin".into(),
            password: "secret".into(),
        }))
    }

    #[test]
    fn test_login_logout() {
        let mut g = gate();
        assert!(!g.is_authenticated());
        assert!(g.login("admin", "secret"));
        assert!(g.is_authenticated());
        g.logout();
        assert!(!g.is_authenticated());
    }

    #[test]
    fn test_wrong_password_relocks() {
        let mut g = gate();
        g.login("admin", "secret");
        assert!(!g.login("admin", "guess"));
        assert!(!g.is_authenticated());
    }

    #[test]
    fn test_unconfigured_gate_never_opens() {
        let mut g = AdminGate::new(None);
        assert!(!g.is_configured());
        assert!(!g.login("", ""));
    }

    #[test]
    fn test_debug_redacts_password() {
        let c = AdminCredentials { username: "u".into(), password: "hunter2".into() };
        assert!(!format!("{:?}", c).contains("hunter2"));
    }
}

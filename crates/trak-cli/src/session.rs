//! File-backed session storage for the CLI.

use std::path::PathBuf;

use trak_core::auth::{AuthError, AuthResult, AuthSession, SessionPersistence};

/// Stores the auth session as a JSON file under the user config directory.
#[derive(Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionPersistence for FileSessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let payload = match std::fs::read_to_string(&self.path) {
            Ok(payload) => payload,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(AuthError::SessionStorage(error.to_string())),
        };

        serde_json::from_str(&payload)
            .map(Some)
            .map_err(|error| AuthError::SessionStorage(error.to_string()))
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let payload = serde_json::to_string_pretty(session)
            .map_err(|error| AuthError::SessionStorage(error.to_string()))?;
        std::fs::write(&self.path, payload)
            .map_err(|error| AuthError::SessionStorage(error.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // The file holds a bearer token
            let _ = std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600));
        }

        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AuthError::SessionStorage(error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn sample_session() -> AuthSession {
        AuthSession {
            access_token: "token".to_string(),
            expires_at: Utc::now() + chrono::Duration::days(1),
            email: "user@example.com".to_string(),
        }
    }

    #[test]
    fn round_trips_a_session() {
        let tmp = tempdir().unwrap();
        let store = FileSessionStore::new(tmp.path().join("session.json"));

        assert!(store.load_session().unwrap().is_none());

        let session = sample_session();
        store.save_session(&session).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session));

        store.clear_session().unwrap();
        assert!(store.load_session().unwrap().is_none());

        // Clearing twice is fine
        store.clear_session().unwrap();
    }
}

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ClientError;
use crate::models::User;
use crate::storage::KeyValueStorage;

pub const ACCESS_KEY: &str = "access";
pub const REFRESH_KEY: &str = "refresh";
pub const USER_KEY: &str = "user";

const SESSION_KEYS: [&str; 3] = [ACCESS_KEY, REFRESH_KEY, USER_KEY];

/// Tokens and profile of the signed-in user. Both tokens and the user are
/// always present together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub current_user: User,
}

impl Session {
    pub fn new(access_token: String, refresh_token: String, current_user: User) -> Self {
        Self {
            access_token,
            refresh_token,
            current_user,
        }
    }
}

/// Persists the session record as three keys in a [`KeyValueStorage`].
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn save(&self, session: &Session) -> Result<(), ClientError> {
        if session.access_token.is_empty() || session.refresh_token.is_empty() {
            return Err(ClientError::validation("Session tokens cannot be empty"));
        }
        let user = serde_json::to_string(&session.current_user)?;

        self.storage.set_many(&[
            (ACCESS_KEY, session.access_token.as_str()),
            (REFRESH_KEY, session.refresh_token.as_str()),
            (USER_KEY, user.as_str()),
        ])
    }

    /// Returns the stored session, or `None` when there is none. A partial or
    /// unreadable record is cleared and reported as `None`.
    pub fn load(&self) -> Option<Session> {
        match self.read() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed stored session");
                if let Err(clear_err) = self.clear() {
                    tracing::warn!(error = %clear_err, "failed to clear malformed session");
                }
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), ClientError> {
        self.storage.remove_many(&SESSION_KEYS)
    }

    /// Bearer token for outbound requests.
    pub fn access_token(&self) -> Option<String> {
        self.load().map(|s| s.access_token)
    }

    fn read(&self) -> Result<Option<Session>, ClientError> {
        let access = non_empty(self.storage.get(ACCESS_KEY)?);
        let refresh = non_empty(self.storage.get(REFRESH_KEY)?);
        let user = non_empty(self.storage.get(USER_KEY)?);

        match (access, refresh, user) {
            (None, None, None) => Ok(None),
            (Some(access_token), Some(refresh_token), Some(user)) => {
                let current_user: User = serde_json::from_str(&user)?;
                Ok(Some(Session {
                    access_token,
                    refresh_token,
                    current_user,
                }))
            }
            _ => Err(ClientError::storage("incomplete session record")),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::rbac::Role;
    use crate::storage::{FileStorage, MemoryStorage};

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::Admin,
            is_active: true,
        }
    }

    fn session() -> Session {
        Session::new("A".to_string(), "R".to_string(), alice())
    }

    fn memory_store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        (storage, store)
    }

    #[test]
    fn test_round_trip() {
        let (_, store) = memory_store();
        store.save(&session()).unwrap();
        assert_eq!(store.load(), Some(session()));
        assert_eq!(store.access_token().as_deref(), Some("A"));
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        SessionStore::new(Arc::new(FileStorage::new(&path)))
            .save(&session())
            .unwrap();

        let reloaded = SessionStore::new(Arc::new(FileStorage::new(&path)));
        assert_eq!(reloaded.load(), Some(session()));
    }

    #[test]
    fn test_load_after_clear_is_empty() {
        let (storage, store) = memory_store();
        store.save(&session()).unwrap();
        store.clear().unwrap();

        assert_eq!(store.load(), None);
        assert_eq!(storage.get(ACCESS_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_empty_store_loads_none() {
        let (_, store) = memory_store();
        assert_eq!(store.load(), None);
        assert_eq!(store.access_token(), None);
    }

    #[test]
    fn test_malformed_user_is_cleared() {
        let (storage, store) = memory_store();
        storage
            .set_many(&[(ACCESS_KEY, "A"), (REFRESH_KEY, "R"), (USER_KEY, "{broken")])
            .unwrap();

        assert_eq!(store.load(), None);
        assert_eq!(storage.get(ACCESS_KEY).unwrap(), None);
        assert_eq!(storage.get(REFRESH_KEY).unwrap(), None);
    }

    #[test]
    fn test_token_without_user_is_cleared() {
        let (storage, store) = memory_store();
        storage.set(ACCESS_KEY, "A").unwrap();

        assert_eq!(store.load(), None);
        assert_eq!(storage.get(ACCESS_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not a json document").unwrap();

        let store = SessionStore::new(Arc::new(FileStorage::new(&path)));
        assert_eq!(store.load(), None);
        // cleared and readable again
        assert_eq!(store.load(), None);
        store.save(&session()).unwrap();
        assert_eq!(store.load(), Some(session()));
    }

    #[test]
    fn test_save_rejects_empty_tokens() {
        let (_, store) = memory_store();
        let mut bad = session();
        bad.refresh_token.clear();
        assert!(store.save(&bad).is_err());
        assert_eq!(store.load(), None);
    }
}

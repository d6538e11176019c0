use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::user::{NewUser, User, UserPatch};
use crate::database::repository::{empty_patch, not_found, UserStore};

/// In-memory store for driving the router in tests. Assigns ids from 1 and
/// enforces a unique `login`, the way a schema with a unique index would.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Rows>,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct Rows {
    next_id: i32,
    users: BTreeMap<i32, User>,
}

impl Rows {
    fn check_login(&self, login: &str, except: Option<i32>) -> Result<(), DatabaseError> {
        let taken = self
            .users
            .values()
            .any(|u| u.login == login && Some(u.id) != except);
        if taken {
            return Err(DatabaseError::ConstraintViolation(
                "duplicate key value violates unique constraint \"users_login_key\"".to_string(),
            ));
        }
        Ok(())
    }
}

impl MemoryUserStore {
    /// Make every operation fail as if the connection was lost
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, Rows>, DatabaseError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::StoreUnavailable(sqlx::Error::PoolClosed));
        }
        Ok(self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list_all(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.rows()?.users.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i32) -> Result<User, DatabaseError> {
        self.rows()?.users.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    async fn insert(&self, user: &NewUser) -> Result<i32, DatabaseError> {
        let mut rows = self.rows()?;
        rows.check_login(&user.login, None)?;
        rows.next_id += 1;
        let id = rows.next_id;
        rows.users.insert(id, user.clone().with_id(id));
        Ok(id)
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        self.rows()?.users.remove(&id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    async fn replace(&self, user: &User) -> Result<(), DatabaseError> {
        let mut rows = self.rows()?;
        if !rows.users.contains_key(&user.id) {
            return Err(not_found(user.id));
        }
        rows.check_login(&user.login, Some(user.id))?;
        rows.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn patch(&self, id: i32, patch: &UserPatch) -> Result<User, DatabaseError> {
        if patch.is_empty() {
            return Err(empty_patch());
        }
        let mut rows = self.rows()?;
        if !rows.users.contains_key(&id) {
            return Err(not_found(id));
        }
        if let Some(login) = &patch.login {
            rows.check_login(login, Some(id))?;
        }
        let user = rows.users.get_mut(&id).ok_or_else(|| not_found(id))?;
        patch.apply(user);
        Ok(user.clone())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.rows().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> NewUser {
        NewUser {
            name: "Ann".into(),
            login: "ann1".into(),
            password: "p".into(),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_fields() {
        let store = MemoryUserStore::default();
        let id = store.insert(&ann()).await.unwrap();
        let user = store.get_by_id(id).await.unwrap();
        assert_eq!(user, ann().with_id(id));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = MemoryUserStore::default();
        assert!(matches!(store.delete(1).await, Err(DatabaseError::NotFound(_))));

        let id = store.insert(&ann()).await.unwrap();
        store.delete(id).await.unwrap();
        assert!(matches!(store.get_by_id(id).await, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn patch_missing_user_with_taken_login_is_not_found() {
        let store = MemoryUserStore::default();
        store.insert(&ann()).await.unwrap();

        let patch = UserPatch {
            login: Some("ann1".into()),
            ..Default::default()
        };
        let result = store.patch(7, &patch).await;
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn patch_to_taken_login_is_constraint_violation() {
        let store = MemoryUserStore::default();
        store.insert(&ann()).await.unwrap();
        let bob = NewUser {
            name: "Bob".into(),
            login: "bob".into(),
            password: "q".into(),
        };
        let id = store.insert(&bob).await.unwrap();

        let patch = UserPatch {
            login: Some("ann1".into()),
            ..Default::default()
        };
        let result = store.patch(id, &patch).await;
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn empty_patch_is_invalid_even_for_missing_user() {
        let store = MemoryUserStore::default();
        let result = store.patch(3, &UserPatch::default()).await;
        assert!(matches!(result, Err(DatabaseError::InvalidArgument(_))));
    }
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub login: String,
    pub password: String,
}

/// Body of create and full replace. A client-supplied `id` is ignored and
/// missing fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl NewUser {
    pub fn with_id(self, id: i32) -> User {
        User {
            id,
            name: self.name,
            login: self.login,
            password: self.password,
        }
    }
}

/// Partial update. Absent or null fields are left unchanged; unknown keys
/// are dropped during decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.login.is_none() && self.password.is_none()
    }

    /// Present fields as (column, value) pairs, in column order
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", self.name.as_deref()),
            ("login", self.login.as_deref()),
            ("password", self.password.as_deref()),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(login) = &self.login {
            user.login = login.clone();
        }
        if let Some(password) = &self.password {
            user.password = password.clone();
        }
    }
}

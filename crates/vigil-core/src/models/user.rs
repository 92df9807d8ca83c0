use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::Role;
use crate::error::CoreError;
use crate::validate::{self, Validate};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
    pub last_login: Option<jiff::Timestamp>,
}

/// Registration payload. The password is hashed before it reaches storage.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl NewUser {
    /// Build the stored user. `role` and `is_verified` are decided by the
    /// caller, not the payload.
    pub fn into_user(self, password_hash: String, role: Role, is_verified: bool, now: jiff::Timestamp) -> User {
        User {
            id: Uuid::new_v4(),
            username: self.username.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            role,
            is_active: true,
            is_verified,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), CoreError> {
        validate::required("username", &self.username, 80)?;
        if !self
            .username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(CoreError::validation(
                "username",
                "may only contain letters, digits, '.', '_' and '-'",
            ));
        }
        validate::required("email", &self.email, 120)?;
        validate::email("email", &self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::validation(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        validate::optional_len("first_name", self.first_name.as_deref(), 50)?;
        validate::optional_len("last_name", self.last_name.as_deref(), 50)?;
        Ok(())
    }
}

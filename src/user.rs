//! User directory for taskwatch.
//!
//! Users are created by signup and never deleted. Emails are unique
//! case-insensitively and normalized to lowercase on write. Passwords are
//! stored as opaque credential blobs and compared byte-for-byte; hardening
//! them is out of scope.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::Storage;

/// Closed role set. Anything else is a policy violation, not a pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "PM")]
    Pm,
    #[serde(rename = "USER")]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pm => "PM",
            Role::User => "USER",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "PM" => Ok(Role::Pm),
            "USER" => Ok(Role::User),
            other => Err(Error::Forbidden(format!("unknown role: {other}"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user record. Carries the credential; never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection of a user safe to return to callers (no credential)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&UserRecord> for UserProfile {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            role: record.role,
        }
    }
}

/// Request payload for signup
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// User directory over the shared storage layer
#[derive(Debug, Clone)]
pub struct UserDirectory {
    storage: Storage,
}

impl UserDirectory {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Register a new user. Emails are lowercased and must be unique.
    pub fn signup(&self, request: SignupRequest) -> Result<UserProfile> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }

        let email = request.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(Error::Validation("email is required".to_string()));
        }

        if request.password.is_empty() {
            return Err(Error::Validation("password is required".to_string()));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name,
            email: email.clone(),
            role: request.role,
            password: request.password,
            created_at: now,
            updated_at: now,
        };

        let profile = UserProfile::from(&record);

        self.storage
            .update_file(&self.storage.users_file(), |users: &mut Vec<UserRecord>| {
                if users.iter().any(|user| user.email == email) {
                    return Err(Error::Validation(format!(
                        "email already registered: {email}"
                    )));
                }
                users.push(record);
                Ok(())
            })?;

        Ok(profile)
    }

    /// Authenticate by email and password
    pub fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "email and password are required".to_string(),
            ));
        }

        let users = self.load()?;
        let user = users
            .iter()
            .find(|user| user.email == email)
            .ok_or_else(|| Error::UserNotFound(email.clone()))?;

        if user.password != password {
            return Err(Error::InvalidCredentials);
        }

        Ok(UserProfile::from(user))
    }

    /// All users, as credential-free profiles
    pub fn list(&self) -> Result<Vec<UserProfile>> {
        let users = self.load()?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    /// Look up a user by id
    pub fn get(&self, user_id: &str) -> Result<UserProfile> {
        let users = self.load()?;
        users
            .iter()
            .find(|user| user.id == user_id)
            .map(UserProfile::from)
            .ok_or_else(|| Error::UserNotFound(user_id.to_string()))
    }

    /// All users holding the PM role (the sweep notification audience)
    pub fn pms(&self) -> Result<Vec<UserProfile>> {
        let users = self.load()?;
        Ok(users
            .iter()
            .filter(|user| user.role == Role::Pm)
            .map(UserProfile::from)
            .collect())
    }

    fn load(&self) -> Result<Vec<UserRecord>> {
        self.storage.read_file(&self.storage.users_file())
    }
}

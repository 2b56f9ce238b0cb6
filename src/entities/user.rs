// 👤 User Entity - Library member with stored credentials
//
// Only the salt and the digest are kept; the plaintext password never
// reaches this struct.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::credentials::Credentials;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Row identity. `None` until the store assigns one.
    pub id: Option<i64>,

    pub firstname: String,

    pub lastname: String,

    pub date_of_birth: NaiveDate,

    /// Unique across all users
    pub email: String,

    /// Base64 of the 16 random salt bytes
    #[serde(skip_serializing)]
    pub password_salt: String,

    /// Base64 of SHA-256(salt ‖ password)
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl User {
    /// New, not yet persisted user
    pub fn new(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        date_of_birth: NaiveDate,
        email: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        User {
            id: None,
            firstname: firstname.into(),
            lastname: lastname.into(),
            date_of_birth,
            email: email.into(),
            password_salt: credentials.salt,
            password_hash: credentials.hash,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id.is_some() && self.id == other.id
    }
}

/// `id | firstname | lastname | dateOfBirth | email`
impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{} | {} | {} | {} | {}",
            id, self.firstname, self.lastname, self.date_of_birth, self.email
        )
    }
}

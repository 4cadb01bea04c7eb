//! The single application user and their stored password hash.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// Integer ID newtype so user IDs cannot be mixed up with other row IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    /// Wrap a raw row ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The underlying row ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The registered user.
///
/// The application is single user: at most one row ever exists in the user
/// table, created once through the registration page.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserID,
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// Returns an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Store the password hash chosen at registration.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the insert failed.
pub fn insert_user(password_hash: PasswordHash, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (password) VALUES (?1)",
        (password_hash.as_ref(),),
    )?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        password_hash,
    })
}

/// Fetch the registered user.
///
/// # Errors
///
/// Returns an [Error::NotFound] when registration has not happened yet, or an
/// [Error::SqlError] if the query failed.
pub fn get_sole_user(connection: &Connection) -> Result<User, Error> {
    connection
        .query_row("SELECT id, password FROM user LIMIT 1", [], |row| {
            let id: i64 = row.get(0)?;
            let password: String = row.get(1)?;

            Ok(User {
                id: UserID::new(id),
                password_hash: PasswordHash::new_unchecked(&password),
            })
        })
        .map_err(|error| error.into())
}

/// Whether registration has already happened.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn user_exists(connection: &Connection) -> Result<bool, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))?;

    Ok(count > 0)
}

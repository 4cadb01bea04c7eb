//! The session token carried inside the private auth cookie.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::auth::UserID;

/// Who is logged in and until when.
///
/// The token is stored as JSON in an encrypted cookie. The expiry is
/// serialized as a unix timestamp so the round trip does not depend on any
/// datetime string format.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    pub user_id: UserID,

    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl SessionToken {
    /// Issue a token for `user_id` that stays valid for `valid_for`.
    pub fn issue(user_id: UserID, valid_for: Duration) -> Self {
        Self {
            user_id,
            expires_at: OffsetDateTime::now_utc() + valid_for,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < OffsetDateTime::now_utc()
    }
}

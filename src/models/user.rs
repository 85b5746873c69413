use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Patch, UserId};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub login: String,
    pub name: String,
    pub birthday: Option<NaiveDate>,
}

/// Payload for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
}

impl NewUser {
    /// Builds the row to insert; a blank display name falls back to the login
    pub fn into_user(self) -> User {
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.login.clone(),
        };

        User {
            id: 0,
            email: self.email,
            login: self.login,
            name,
            birthday: self.birthday,
        }
    }
}

/// Partial update of a user
#[derive(Debug, Clone, Deserialize)]
pub struct UserPatch {
    pub id: UserId,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub login: Patch<String>,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub birthday: Patch<NaiveDate>,
}

impl UserPatch {
    pub fn apply_to(self, user: &mut User) {
        self.email.apply_to(&mut user.email);
        self.login.apply_to(&mut user.login);
        self.name
            .filter(|name| !name.trim().is_empty())
            .apply_to(&mut user.name);
        if let Some(birthday) = self.birthday.into_option() {
            user.birthday = Some(birthday);
        }
    }
}

/// Confirmation state of one directed friendship edge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Unconfirmed,
    Confirmed,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Unconfirmed => "unconfirmed",
            FriendshipStatus::Confirmed => "confirmed",
        }
    }
}

impl std::str::FromStr for FriendshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unconfirmed" => Ok(FriendshipStatus::Unconfirmed),
            "confirmed" => Ok(FriendshipStatus::Confirmed),
            other => Err(format!("unknown friendship status '{}'", other)),
        }
    }
}

/// One outgoing friendship edge, requester to target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub user_id: UserId,
    pub friend_id: UserId,
    pub status: FriendshipStatus,
}

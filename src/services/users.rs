use chrono::Utc;
use std::sync::Arc;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{NewUser, User, UserId, UserPatch},
    validation::validate_user,
};

/// Fails with NotFound unless the user exists
pub(crate) async fn require_user(users: &dyn UserStore, id: UserId) -> AppResult<()> {
    if users.user_exists(id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("User", id))
    }
}

/// User registration and profile maintenance
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn add_user(&self, payload: NewUser) -> AppResult<User> {
        let user = payload.into_user();
        if let Err(e) = validate_user(&user, Utc::now().date_naive()).into_result() {
            tracing::warn!(login = %user.login, error = %e, "Rejected new user");
            return Err(e);
        }

        let user = self.users.insert_user(user).await?;
        tracing::info!(user_id = user.id, login = %user.login, "User created");
        Ok(user)
    }

    pub async fn update_user(&self, patch: UserPatch) -> AppResult<User> {
        let mut user = self.get_user(patch.id).await?;
        patch.apply_to(&mut user);

        if let Err(e) = validate_user(&user, Utc::now().date_naive()).into_result() {
            tracing::warn!(user_id = user.id, error = %e, "Rejected user update");
            return Err(e);
        }

        if !self.users.update_user(user.clone()).await? {
            return Err(AppError::storage(format!(
                "update of user {} matched no rows",
                user.id
            )));
        }

        tracing::info!(user_id = user.id, "User updated");
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> AppResult<User> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    pub async fn get_all_users(&self) -> AppResult<Vec<User>> {
        self.users.list_users().await
    }

    pub async fn delete_user(&self, id: UserId) -> AppResult<()> {
        if !self.users.delete_user(id).await? {
            return Err(AppError::not_found("User", id));
        }
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}

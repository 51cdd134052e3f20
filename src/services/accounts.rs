//! Sign-in and account management shared by the API and the admin CLI.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{self, AuthError, Claims};
use crate::config::SecurityConfig;
use crate::database::models::{NewUser, User, UserUpdate};
use crate::database::{DatabaseError, Stores};
use crate::types::Role;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Email '{0}' is already registered")]
    EmailTaken(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_in_hours: u64,
    pub user: User,
}

pub fn normalize_email(raw: &str) -> Result<String, AccountError> {
    let email = raw.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .map_or(false, |(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !valid {
        return Err(AccountError::InvalidEmail);
    }
    Ok(email)
}

/// Verifies credentials and issues a token. Unknown email and wrong
/// password produce the same error.
pub async fn login(
    stores: &Stores,
    security: &SecurityConfig,
    email: &str,
    password: &str,
) -> Result<Session, AccountError> {
    let user = stores
        .users
        .find_by_email(email.trim())
        .await?
        .filter(|u| auth::verify_password(password, &u.password_hash))
        .ok_or_else(|| {
            warn!("Failed login for {}", email.trim());
            AuthError::InvalidCredentials
        })?;

    if !user.is_active {
        return Err(AuthError::Inactive.into());
    }

    let claims = Claims::new(user.id, user.tenant_id, user.role, security.jwt_expiry_hours);
    let token = auth::generate_jwt(&claims, security)?;
    info!("User {} signed in", user.email);

    Ok(Session {
        token,
        expires_in_hours: security.jwt_expiry_hours,
        user,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
}

pub async fn create_user(
    stores: &Stores,
    tenant_id: Option<Uuid>,
    request: CreateUser,
) -> Result<User, AccountError> {
    let email = normalize_email(&request.email)?;
    if stores.users.find_by_email(&email).await?.is_some() {
        return Err(AccountError::EmailTaken(email));
    }
    let password_hash = auth::hash_password(&request.password)?;
    let user = stores
        .users
        .create(NewUser {
            tenant_id,
            email,
            name: request.name.trim().to_string(),
            password_hash,
            role: request.role,
        })
        .await?;
    Ok(user)
}

pub async fn change_password(
    stores: &Stores,
    user: &User,
    current: &str,
    new: &str,
) -> Result<(), AccountError> {
    if !auth::verify_password(current, &user.password_hash) {
        return Err(AuthError::InvalidCredentials.into());
    }
    let password_hash = auth::hash_password(new)?;
    stores
        .users
        .update(
            user.id,
            UserUpdate {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;
    Ok(())
}

/// Creates the landlord account when no user holds that email yet.
/// Returns `true` when an account was created.
pub async fn ensure_landlord(
    stores: &Stores,
    email: &str,
    password: &str,
    name: &str,
) -> Result<bool, AccountError> {
    let email = normalize_email(email)?;
    if stores.users.find_by_email(&email).await?.is_some() {
        return Ok(false);
    }
    create_user(
        stores,
        None,
        CreateUser {
            email: email.clone(),
            name: name.to_string(),
            password: password.to_string(),
            role: Role::Landlord,
        },
    )
    .await?;
    info!("Landlord account {} created", email);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn login_issues_token_for_active_user() {
        let stores = Stores::memory();
        let security = AppConfig::development().security;
        assert!(ensure_landlord(&stores, "root@storeflow.test", "supersecret", "Root").await.unwrap());
        assert!(!ensure_landlord(&stores, "ROOT@storeflow.test", "supersecret", "Root").await.unwrap());

        let session = login(&stores, &security, "Root@StoreFlow.test", "supersecret").await.unwrap();
        let claims = auth::validate_jwt(&session.token, &security).unwrap();
        assert_eq!(claims.sub, session.user.id);
        assert_eq!(claims.role, Role::Landlord);
        assert_eq!(claims.tenant_id, None);
    }

    #[tokio::test]
    async fn wrong_password_and_inactive_users_are_refused() {
        let stores = Stores::memory();
        let security = AppConfig::development().security;
        ensure_landlord(&stores, "root@storeflow.test", "supersecret", "Root").await.unwrap();

        let err = login(&stores, &security, "root@storeflow.test", "nope-nope").await.unwrap_err();
        assert!(matches!(err, AccountError::Auth(AuthError::InvalidCredentials)));

        let user = stores.users.find_by_email("root@storeflow.test").await.unwrap().unwrap();
        stores
            .users
            .update(user.id, UserUpdate { is_active: Some(false), ..Default::default() })
            .await
            .unwrap();
        let err = login(&stores, &security, "root@storeflow.test", "supersecret").await.unwrap_err();
        assert!(matches!(err, AccountError::Auth(AuthError::Inactive)));
    }

    #[tokio::test]
    async fn change_password_requires_current() {
        let stores = Stores::memory();
        ensure_landlord(&stores, "root@storeflow.test", "supersecret", "Root").await.unwrap();
        let user = stores.users.find_by_email("root@storeflow.test").await.unwrap().unwrap();

        assert!(change_password(&stores, &user, "wrong-one", "newsecret1").await.is_err());
        change_password(&stores, &user, "supersecret", "newsecret1").await.unwrap();
        let user = stores.users.get(user.id).await.unwrap().unwrap();
        assert!(auth::verify_password("newsecret1", &user.password_hash));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  A@B.Test ").unwrap(), "a@b.test");
        assert!(normalize_email("a@b").is_err());
        assert!(normalize_email("@b.test").is_err());
    }
}

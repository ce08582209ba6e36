use lazy_static::lazy_static;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, hash_password_blocking, verify_password, verify_password_blocking},
    validation::{normalize_email, validate_registration},
};
use crate::{
    error::AuthError,
    store::{NewUser, Role, StoreError, User, UserStore},
};

lazy_static! {
    // Verified against when the email is unknown, so both login failures
    // cost one Argon2 verification.
    static ref DUMMY_HASH: String = hash_password("dummy-password").unwrap_or_default();
}

/// A successful login.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Validates, hashes and stores a new user with the default role.
pub async fn register(store: &dyn UserStore, req: RegisterRequest) -> Result<User, AuthError> {
    let valid = validate_registration(req)?;
    let password_hash = hash_password_blocking(valid.password).await?;

    let user = store
        .insert(NewUser {
            name: valid.name,
            email: valid.email.clone(),
            password_hash,
            role: Role::User,
        })
        .await
        .map_err(|e| {
            if matches!(e, StoreError::DuplicateEmail) {
                warn!(email = %valid.email, "email already registered");
            }
            AuthError::from(e)
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Checks credentials and mints a token. Unknown email and wrong password
/// fail identically.
pub async fn login(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<Session, AuthError> {
    let email = normalize_email(&req.email);

    let Some(user) = store.find_by_email(&email).await? else {
        let password = req.password;
        let dummy = tokio::task::spawn_blocking(move || verify_password(&password, &DUMMY_HASH));
        if let Err(e) = dummy.await {
            warn!(error = %e, "dummy password verification task failed");
        }
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let token = keys.mint(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Session { token, user })
}

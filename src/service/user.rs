use log::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    errors::AppError,
    models::User,
    service::auth::jwt::{self, TokenKeys},
    PGPool,
};

use super::{crypto, validation};

const INVALID_CREDENTIALS: &str = "invalid email or password";

pub fn validate_registration(dto: &RegisterRequest) -> Result<String, AppError> {
    let email = dto.email.trim();
    if email.is_empty() {
        return Err(AppError::validation("email is required"));
    }
    if !validation::is_valid_email(email) {
        return Err(AppError::validation("invalid email format"));
    }
    if dto.password.is_empty() {
        return Err(AppError::validation("password is required"));
    }
    Ok(email.to_string())
}

pub async fn register(dto: RegisterRequest, keys: &TokenKeys, pool: &PGPool) -> Result<AuthResponse, AppError> {
    let email = validate_registration(&dto)?;
    if db::user::exists_by_email(&email, pool).await? {
        return Err(AppError::validation("email is already registered"));
    }

    let password_hash = crypto::hash_password(&dto.password)?;
    let user = db::user::create(Uuid::new_v4(), &email, &password_hash, pool)
        .await
        .map_err(|err| match AppError::from(err) {
            // lost a race with a concurrent registration
            AppError::Conflict(_) => AppError::validation("email is already registered"),
            other => other,
        })?;
    info!("registered user {}", user.id);

    let token = jwt::create(user.id, keys)?;
    Ok(AuthResponse { token })
}

pub async fn login(dto: LoginRequest, keys: &TokenKeys, pool: &PGPool) -> Result<AuthResponse, AppError> {
    let Some(user) = db::user::get_by_email(dto.email.trim(), pool).await? else {
        warn!("login attempt for unknown email");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };
    if !crypto::verify_password(&dto.password, &user.password_hash)? {
        warn!("login attempt with wrong password for user {}", user.id);
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = jwt::create(user.id, keys)?;
    Ok(AuthResponse { token })
}

/// The caller's own record; a token whose user has since vanished is no longer valid.
pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<User, AppError> {
    db::user::get_by_id(id, pool)
        .await?
        .ok_or_else(|| AppError::unauthorized("user no longer exists"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn registration_trims_the_email() {
        let email = validate_registration(&request("  ada@example.com ", "pw")).unwrap();
        assert_eq!(email, "ada@example.com");
    }

    #[test]
    fn registration_requires_a_password() {
        let err = validate_registration(&request("ada@example.com", "")).unwrap_err();
        assert_eq!(err, AppError::validation("password is required"));
    }

    #[test]
    fn registration_requires_a_well_formed_email() {
        assert_eq!(
            validate_registration(&request("", "pw")).unwrap_err(),
            AppError::validation("email is required")
        );
        assert_eq!(
            validate_registration(&request("ada-at-example.com", "pw")).unwrap_err(),
            AppError::validation("invalid email format")
        );
    }
}

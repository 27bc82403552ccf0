use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use models::user::{NewUser, User};

use super::domain::{AuthSession, Identity, LoginInput, RegisterInput};
use super::errors::AuthError;
use crate::errors::ServiceError;
use crate::facade::Facade;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    uid: String,
    adm: bool,
    exp: usize,
}

/// Credential and token workflows over the facade, independent of the web
/// framework. Passwords are hashed with argon2 before they reach the
/// model layer; tokens are JWTs carrying the subject id and admin flag.
pub struct AuthService {
    facade: Arc<Facade>,
    cfg: AuthConfig,
}

impl AuthService {
    pub fn new(facade: Arc<Facade>, cfg: AuthConfig) -> Self {
        Self { facade, cfg }
    }

    /// Register a new non-admin user with a hashed password.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub fn register(&self, input: RegisterInput) -> Result<User, AuthError> {
        self.insert_user(input, false)
    }

    /// Create a user with a caller-controlled admin flag. Unlike open
    /// registration this path requires an admin requester, checked here so
    /// no caller of the service layer can skip the gate.
    pub fn create_user(
        &self,
        input: RegisterInput,
        is_admin: bool,
        requester: &Identity,
    ) -> Result<User, AuthError> {
        if !requester.is_admin {
            return Err(AuthError::Forbidden);
        }
        self.insert_user(input, is_admin)
    }

    fn insert_user(&self, input: RegisterInput, is_admin: bool) -> Result<User, AuthError> {
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        let password_hash = hash_password(&input.password)?;
        let user = self
            .facade
            .create_user(NewUser {
                id: None,
                first_name: input.first_name,
                last_name: input.last_name,
                email: input.email,
                password_hash,
                is_admin,
            })
            .map_err(map_create_error)?;
        info!(user_id = %user.meta.id, email = %user.email, event = "user_registered", "user registered");
        Ok(user)
    }

    /// Ensure a configured admin account exists. Returns the created user,
    /// or `None` when the address is already registered.
    pub fn seed_admin(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        if self.facade.get_user_by_email(email).is_some() {
            debug!(email = %email, "admin seed skipped, email already registered");
            return Ok(None);
        }
        let password_hash = hash_password(password)?;
        match self.facade.create_user(NewUser {
            id: None,
            first_name: "Admin".into(),
            last_name: "Admin".into(),
            email: email.into(),
            password_hash,
            is_admin: true,
        }) {
            Ok(user) => {
                info!(user_id = %user.meta.id, event = "admin_seeded", "admin account seeded");
                Ok(Some(user))
            }
            // lost a race with a concurrent registration of the same email
            Err(ServiceError::DuplicateKey(_)) => Ok(None),
            Err(err) => Err(map_create_error(err)),
        }
    }

    /// Authenticate a user by email/password and issue a bearer token.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self
            .facade
            .get_user_by_email(&input.email)
            .ok_or(AuthError::Unauthorized)?;

        let parsed =
            PasswordHash::new(&user.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default()
            .verify_password(input.password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(AuthError::Unauthorized);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.meta.id, event = "user_login", "login succeeded");
        Ok(AuthSession { user, token })
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours))
            .timestamp() as usize;
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.meta.id.to_string(),
            adm: user.is_admin,
            exp,
        };
        encode(
            &JwtHeader::default(),
            &claims,
            &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Verify a bearer token and yield the requester identity, or
    /// `Unauthenticated` for any missing/expired/tampered credential.
    pub fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AuthError::Unauthenticated)?;
        let user_id = Uuid::parse_str(&data.claims.uid).map_err(|_| AuthError::Unauthenticated)?;
        Ok(Identity { user_id, is_admin: data.claims.adm })
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

fn map_create_error(err: ServiceError) -> AuthError {
    match err {
        ServiceError::DuplicateKey(_) => AuthError::Conflict,
        ServiceError::InvalidInput(msg) => AuthError::Validation(msg),
        other => AuthError::Validation(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(Facade::new()),
            AuthConfig { jwt_secret: "test-secret".into(), token_ttl_hours: 1 },
        )
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput {
            first_name: "Test".into(),
            last_name: "User".into(),
            email: email.into(),
            password: "S3curePass!".into(),
        }
    }

    #[test]
    fn register_then_login_round_trips() {
        let svc = service();
        let user = svc.register(register_input("u@example.com")).unwrap();
        assert!(!user.is_admin);

        let session = svc
            .login(LoginInput { email: "u@example.com".into(), password: "S3curePass!".into() })
            .unwrap();
        assert_eq!(session.user.meta.id, user.meta.id);

        let identity = svc.authenticate(&session.token).unwrap();
        assert_eq!(identity.user_id, user.meta.id);
        assert!(!identity.is_admin);
    }

    #[test]
    fn short_password_is_rejected() {
        let svc = service();
        let mut input = register_input("u@example.com");
        input.password = "short".into();
        assert!(matches!(svc.register(input), Err(AuthError::Validation(_))));
    }

    #[test]
    fn duplicate_registration_conflicts() {
        let svc = service();
        svc.register(register_input("u@example.com")).unwrap();
        assert!(matches!(
            svc.register(register_input("u@example.com")),
            Err(AuthError::Conflict)
        ));
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let svc = service();
        svc.register(register_input("u@example.com")).unwrap();
        let res = svc.login(LoginInput { email: "u@example.com".into(), password: "WrongPass1".into() });
        assert!(matches!(res, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn tampered_token_is_unauthenticated() {
        let svc = service();
        svc.register(register_input("u@example.com")).unwrap();
        let session = svc
            .login(LoginInput { email: "u@example.com".into(), password: "S3curePass!".into() })
            .unwrap();
        let mut tampered = session.token;
        tampered.push('x');
        assert!(matches!(svc.authenticate(&tampered), Err(AuthError::Unauthenticated)));
        assert!(matches!(svc.authenticate("garbage"), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn create_user_requires_admin_requester() {
        let svc = service();
        let plain = svc.register(register_input("plain@example.com")).unwrap();
        let admin = svc.seed_admin("admin@example.com", "S3curePass!").unwrap().unwrap();

        let not_admin = Identity { user_id: plain.meta.id, is_admin: plain.is_admin };
        assert!(matches!(
            svc.create_user(register_input("new@example.com"), true, &not_admin),
            Err(AuthError::Forbidden)
        ));

        let as_admin = Identity { user_id: admin.meta.id, is_admin: admin.is_admin };
        let created = svc
            .create_user(register_input("new@example.com"), true, &as_admin)
            .unwrap();
        assert!(created.is_admin);
    }

    #[test]
    fn seed_admin_is_idempotent() {
        let svc = service();
        let seeded = svc.seed_admin("admin@example.com", "S3curePass!").unwrap();
        assert!(seeded.is_some_and(|u| u.is_admin));
        assert!(svc.seed_admin("admin@example.com", "S3curePass!").unwrap().is_none());

        let identity = svc
            .login(LoginInput { email: "admin@example.com".into(), password: "S3curePass!".into() })
            .map(|s| svc.authenticate(&s.token).unwrap())
            .unwrap();
        assert!(identity.is_admin);
    }
}

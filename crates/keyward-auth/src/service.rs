//! Authentication service — registration, login and session orchestration.

use std::fmt;

use keyward_core::error::StoreError;
use keyward_core::repository::{CredentialRepository, SessionRepository};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password::{self, PasswordHashParameters};
use crate::session::SessionManager;

/// Input for the registration flow.
pub struct RegisterInput {
    pub principal_id: String,
    pub password: String,
}

/// Input for the login flow.
pub struct LoginInput {
    pub principal_id: String,
    pub password: String,
}

/// Successful login result.
pub struct LoginOutput {
    /// Raw session token (return to client, only its digest is stored).
    pub token: String,
    pub principal_id: String,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("principal_id", &self.principal_id)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("principal_id", &self.principal_id)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for LoginOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginOutput")
            .field("principal_id", &self.principal_id)
            .finish_non_exhaustive()
    }
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<C: CredentialRepository, S: SessionRepository> {
    credentials: C,
    sessions: SessionManager<S>,
    config: AuthConfig,
}

impl<C: CredentialRepository, S: SessionRepository> AuthService<C, S> {
    pub fn new(credentials: C, session_repo: S, config: AuthConfig) -> Result<Self, AuthError> {
        config.validate()?;
        let sessions = SessionManager::new(session_repo, config.session_policy());
        Ok(Self {
            credentials,
            sessions,
            config,
        })
    }

    pub fn sessions(&self) -> &SessionManager<S> {
        &self.sessions
    }

    /// Store a credential for a new principal.
    pub async fn register(&self, input: RegisterInput) -> Result<(), AuthError> {
        if input.password.chars().count() < self.config.min_password_length {
            return Err(AuthError::PasswordTooShort {
                min: self.config.min_password_length,
            });
        }

        let encoded = hash_blocking(input.password, self.config.password_hash).await?;

        self.credentials
            .create_credential(&input.principal_id, &encoded)
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists { .. } => AuthError::PrincipalExists,
                other => other.into(),
            })?;

        info!(principal_id = %input.principal_id, "Principal registered");
        Ok(())
    }

    /// Check a password and open a session.
    ///
    /// Unknown principals and wrong passwords are indistinguishable to
    /// the caller, both in result and in time spent.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, AuthError> {
        // 1. Look up the stored credential.
        let credential = match self.credentials.get_credential(&input.principal_id).await {
            Ok(c) => c,
            Err(StoreError::NotFound { .. }) => {
                // Pay for one derivation anyway.
                let _ = hash_blocking(input.password, self.config.password_hash).await;
                debug!(principal_id = %input.principal_id, "Login for unknown principal");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        // 2. Verify against the parameters embedded in the stored hash.
        let stored = credential.password_hash;
        let (valid, password) = verify_blocking(input.password, stored.clone()).await?;
        if !valid {
            debug!(principal_id = %input.principal_id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        // 3. Upgrade hashes made with older parameters.
        if self.config.rehash_on_login
            && password::needs_rehash(&stored, &self.config.password_hash)?
        {
            let upgraded = hash_blocking(password, self.config.password_hash).await?;
            self.credentials
                .put_credential(&input.principal_id, &upgraded)
                .await?;
            info!(principal_id = %input.principal_id, "Password hash parameters upgraded");
        }

        // 4. Open a session.
        let token = self.sessions.issue(&input.principal_id).await?;

        info!(principal_id = %input.principal_id, "Login succeeded");
        Ok(LoginOutput {
            token: token.into_string(),
            principal_id: input.principal_id,
        })
    }

    /// Resolve a session token to its principal.
    pub async fn authenticate(&self, token: &str) -> Result<String, AuthError> {
        self.sessions.validate(token).await
    }

    /// Invalidate a single session (logout).
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.revoke(token).await
    }
}

/// Hash on the blocking pool; derivation takes hundreds of milliseconds.
async fn hash_blocking(
    password: String,
    params: PasswordHashParameters,
) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        password::hash_password(password.as_bytes(), &params).map(|h| h.to_string())
    })
    .await
    .map_err(|e| {
        warn!(error = %e, "Hashing task failed");
        AuthError::Hashing(format!("hashing task: {e}"))
    })?
}

/// Verify on the blocking pool, handing the password back for re-hashing.
async fn verify_blocking(
    password: String,
    encoded: String,
) -> Result<(bool, String), AuthError> {
    tokio::task::spawn_blocking(move || {
        password::verify_password(password.as_bytes(), &encoded).map(|ok| (ok, password))
    })
    .await
    .map_err(|e| {
        warn!(error = %e, "Verification task failed");
        AuthError::Hashing(format!("verification task: {e}"))
    })?
}

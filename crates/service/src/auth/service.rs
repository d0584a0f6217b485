use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, error, info, instrument, warn};

use super::domain::{Customer, History, LogInInput, LogInOutput, Profile, SignUpInput, SignUpOutput, User};
use super::errors::AuthError;
use super::hasher::{CredentialHasher, HashCost};
use super::repository::{complete, AccountStore};
use super::token::{TokenIssuer, DEFAULT_TOKEN_TTL_DAYS};

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub hash_cost: HashCost,
}

impl AuthConfig {
    /// 30-day tokens and the default Argon2id cost.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self { jwt_secret: jwt_secret.into(), token_ttl: Duration::days(DEFAULT_TOKEN_TTL_DAYS), hash_cost: HashCost::default() }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<S: AccountStore + ?Sized> {
    store: Arc<S>,
    hasher: CredentialHasher,
    tokens: TokenIssuer,
}

impl<S: AccountStore + ?Sized> AuthService<S> {
    pub fn new(store: Arc<S>, cfg: AuthConfig) -> Result<Self, AuthError> {
        let hasher = CredentialHasher::new(cfg.hash_cost)?;
        let tokens = TokenIssuer::new(&cfg.jwt_secret, cfg.token_ttl)?;
        Ok(Self { store, hasher, tokens })
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register a user and its customer profile in one unit of work.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthConfig, AuthService, repository::mock::MockAccountStore};
    /// use service::auth::domain::SignUpInput;
    /// use std::sync::Arc;
    /// let store = Arc::new(MockAccountStore::default());
    /// let svc = AuthService::new(store.clone(), AuthConfig::new("secret")).unwrap();
    /// let input = SignUpInput { email: "user@example.com".into(), password: "Secret123".into(), first_name: "Ada".into(), last_name: "Lovelace".into() };
    /// let out = tokio_test::block_on(svc.sign_up(input)).unwrap();
    /// assert_eq!(out.email, "user@example.com");
    /// assert_eq!(store.customers().len(), 1);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_up(&self, input: SignUpInput) -> Result<SignUpOutput, AuthError> {
        input.validate()?;
        let hash = self.hasher.hash(&input.password)?;

        let user = User::new(&input.email, hash);
        let customer = Customer::new(user.id, &input.first_name, &input.last_name);

        let mut uow = self.store.begin().await?;
        let outcome: Result<(), AuthError> = async {
            uow.insert_user(&user).await?;
            uow.insert_customer(&customer).await
        }
        .await;
        if let Err(e) = complete(uow, outcome).await {
            warn!(error = %e, code = e.code(), "sign_up_failed");
            return Err(e);
        }

        info!(user_id = %user.id, customer_id = %customer.id, "user_signed_up");
        Ok(SignUpOutput { first_name: customer.first_name, last_name: customer.last_name, email: user.email })
    }

    /// Verify credentials, then rotate the stored token and append a login
    /// history entry in one unit of work.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthConfig, AuthService, repository::mock::MockAccountStore};
    /// use service::auth::domain::{SignUpInput, LogInInput};
    /// use std::sync::Arc;
    /// let store = Arc::new(MockAccountStore::default());
    /// let svc = AuthService::new(store.clone(), AuthConfig::new("secret")).unwrap();
    /// let _ = tokio_test::block_on(svc.sign_up(SignUpInput { email: "u@e.com".into(), password: "Passw0rd".into(), first_name: "N".into(), last_name: "M".into() }));
    /// let out = tokio_test::block_on(svc.log_in(LogInInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert!(!out.token.is_empty());
    /// assert_eq!(store.history().len(), 1);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn log_in(&self, input: LogInInput) -> Result<LogInOutput, AuthError> {
        let user = self.store.find_user_by_email(&input.email).await?.ok_or(AuthError::NotFound)?;

        let matches = self.hasher.verify(&user.password_hash, &input.password).map_err(|e| {
            error!(user_id = %user.id, error = %e, "stored password digest is unusable");
            e
        })?;
        if !matches {
            debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::Unauthorized);
        }

        let mut uow = self.store.begin().await?;
        let outcome: Result<String, AuthError> = async {
            let token = self.tokens.issue(user.id)?;
            uow.set_user_token(user.id, Some(&token)).await?;
            let customer = uow
                .find_customer_by_user(user.id)
                .await?
                .ok_or_else(|| AuthError::Integrity(format!("user {} has no customer", user.id)))?;
            uow.insert_history(&History::login(customer.id)).await?;
            Ok(token)
        }
        .await;

        match complete(uow, outcome).await {
            Ok(token) => {
                info!(user_id = %user.id, "user_logged_in");
                Ok(LogInOutput { token })
            }
            Err(e @ AuthError::Integrity(_)) => {
                error!(user_id = %user.id, error = %e, "login aborted: account data is inconsistent");
                Err(e)
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, code = e.code(), "log_in_failed");
                Err(e)
            }
        }
    }

    /// Clear the caller's stored token.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn log_out(&self, user: &User) -> Result<(), AuthError> {
        let mut uow = self.store.begin().await?;
        let outcome = uow.set_user_token(user.id, None).await;
        complete(uow, outcome).await?;
        info!("user_logged_out");
        Ok(())
    }

    /// Resolve a bearer token to its user.
    ///
    /// The token must verify and name an existing user who is logged in (has a
    /// stored token). Every token issued since the last logout stays valid until
    /// it expires; anything else is [`AuthError::Unauthorized`].
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthError::Unauthorized
        })?;
        let user_id = claims.user_id().map_err(|_| AuthError::Unauthorized)?;
        let user = self.store.find_user_by_id(user_id).await?.ok_or(AuthError::Unauthorized)?;
        if !user.is_logged_in() {
            debug!(user_id = %user.id, "token revoked by logout");
            return Err(AuthError::Unauthorized);
        }
        Ok(user)
    }

    pub async fn profile(&self, user: &User) -> Result<Profile, AuthError> {
        let customer = self
            .store
            .find_customer_by_user(user.id)
            .await?
            .ok_or_else(|| AuthError::Integrity(format!("user {} has no customer", user.id)))?;
        Ok(Profile { id: user.id, email: user.email.clone(), first_name: customer.first_name, last_name: customer.last_name })
    }

    /// Audit entries for the caller, newest first.
    pub async fn history(&self, user: &User) -> Result<Vec<History>, AuthError> {
        let customer = self
            .store
            .find_customer_by_user(user.id)
            .await?
            .ok_or_else(|| AuthError::Integrity(format!("user {} has no customer", user.id)))?;
        self.store.list_history(customer.id).await
    }
}

//! Registration and login orchestration.

use crate::auth::password::Hasher;
use crate::auth::token::TokenCodec;
use crate::auth::Role;
use crate::error::{ApiError, ApiResult};
use crate::store::{AccountInfo, AuditOutcome, Store};
use std::sync::Arc;

/// Request-scoped caller metadata, recorded with every login-flow event.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub ip: String,
    pub user_agent: String,
}

/// A freshly issued session.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AccountInfo,
}

pub struct AuthService {
    store: Arc<Store>,
    tokens: TokenCodec,
    passwords: Hasher,
    token_ttl_secs: i64,
    min_password_len: usize,
    /// Hash of a throwaway password, verified against when the login
    /// identifier is unknown so both failure paths do the same work.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        store: Arc<Store>,
        tokens: TokenCodec,
        passwords: Hasher,
        token_ttl_secs: i64,
        min_password_len: usize,
    ) -> anyhow::Result<Self> {
        let dummy_hash = passwords.hash("timing-equalizer")?;
        Ok(Self {
            store,
            tokens,
            passwords,
            token_ttl_secs,
            min_password_len,
            dummy_hash,
        })
    }

    pub fn token_codec(&self) -> &TokenCodec {
        &self.tokens
    }

    pub fn token_ttl_secs(&self) -> i64 {
        self.token_ttl_secs
    }

    /// Create an account and issue its first session token.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        meta: &RequestMeta,
    ) -> ApiResult<AuthSession> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "username, email and password are required".into(),
            ));
        }
        if !email.contains('@') {
            return Err(ApiError::Validation("email is not valid".into()));
        }
        if password.len() < self.min_password_len {
            return Err(ApiError::WeakPassword(self.min_password_len));
        }
        if self.store.identity_exists(username, email)? {
            return Err(ApiError::DuplicateIdentity);
        }

        let hash = self.passwords.hash(password)?;
        // The unique constraints close the race between the check above and
        // this insert.
        let id = self
            .store
            .insert_account(username, email, &hash, Role::User)?
            .ok_or(ApiError::DuplicateIdentity)?;

        self.audit(Some(id), username, meta, AuditOutcome::Registered);

        let account = self
            .store
            .account_by_id(id)?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("account vanished after insert")))?;
        let token = self
            .tokens
            .issue(id, username, account.role, self.token_ttl_secs)?;
        Ok(AuthSession {
            token,
            user: AccountInfo::from(&account),
        })
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown identifier and wrong password are indistinguishable to the
    /// caller: same error, same hashing work.
    pub fn login(&self, identifier: &str, password: &str, meta: &RequestMeta) -> ApiResult<AuthSession> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "identifier and password are required".into(),
            ));
        }

        let account = match self.store.account_by_identifier(identifier)? {
            Some(account) => account,
            None => {
                self.passwords.verify(password, &self.dummy_hash);
                self.audit(None, identifier, meta, AuditOutcome::Failed);
                return Err(ApiError::InvalidCredentials);
            }
        };

        if !self.passwords.verify(password, &account.password_hash) {
            self.audit(Some(account.id), &account.username, meta, AuditOutcome::Failed);
            return Err(ApiError::InvalidCredentials);
        }

        self.store.touch_last_login(account.id)?;
        self.audit(Some(account.id), &account.username, meta, AuditOutcome::Success);

        let token = self
            .tokens
            .issue(account.id, &account.username, account.role, self.token_ttl_secs)?;
        let account = self.store.account_by_id(account.id)?.ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("account vanished during login"))
        })?;
        Ok(AuthSession {
            token,
            user: AccountInfo::from(&account),
        })
    }

    /// Resolve a verified subject to its current account record. Tokens
    /// outlive deletions, so a valid signature can still point nowhere.
    pub fn current_user(&self, subject: i64) -> ApiResult<AccountInfo> {
        let account = self
            .store
            .account_by_id(subject)?
            .ok_or(ApiError::Unauthorized)?;
        Ok(AccountInfo::from(&account))
    }

    /// Create the configured admin account when no admin exists yet.
    /// Returns true when an account was created.
    pub fn ensure_admin(&self, username: &str, email: &str, password: &str) -> anyhow::Result<bool> {
        if self.store.admin_count()? > 0 {
            return Ok(false);
        }
        let hash = self.passwords.hash(password)?;
        let created = self
            .store
            .insert_account(username, email, &hash, Role::Admin)?
            .is_some();
        Ok(created)
    }

    /// Audit writes are best effort: a failed log line must not fail the
    /// login it describes.
    fn audit(&self, user_id: Option<i64>, username: &str, meta: &RequestMeta, outcome: AuditOutcome) {
        if let Err(e) =
            self.store
                .record_login_event(user_id, username, &meta.ip, &meta.user_agent, outcome)
        {
            tracing::warn!(username, ?outcome, error = %e, "failed to record login event");
        }
    }
}

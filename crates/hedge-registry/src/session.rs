//! Bearer-token sessions for managed accounts.
//!
//! A session is obtained by signing an auth challenge with the account's
//! StarkNet key. Tokens are refreshed unconditionally at the start of every
//! cycle; a failed refresh clears the token and is not retried.

use std::sync::Arc;

use hedge_core::{AccountId, Clock};
use hedge_signer::{AuthRequest, HedgeAccount, StarkDomain};
use hedge_telemetry::Metrics;
use tracing::{debug, warn};

use crate::api::{AuthHeaders, DynExchangeApi};
use crate::error::{RegistryError, RegistryResult};

/// JWT and its expiry (unix seconds).
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    jwt: String,
    expires_at: u64,
}

impl SessionToken {
    pub fn new(jwt: impl Into<String>, expires_at: u64) -> Self {
        Self {
            jwt: jwt.into(),
            expires_at,
        }
    }

    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn is_expired(&self, now_secs: u64) -> bool {
        now_secs >= self.expires_at
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// An account together with its current session.
#[derive(Debug, Clone)]
pub struct ManagedAccount {
    account: HedgeAccount,
    session: Option<SessionToken>,
}

impl ManagedAccount {
    pub fn new(account: HedgeAccount) -> Self {
        Self {
            account,
            session: None,
        }
    }

    pub fn id(&self) -> &AccountId {
        self.account.id()
    }

    pub fn account(&self) -> &HedgeAccount {
        &self.account
    }

    pub fn session(&self) -> Option<&SessionToken> {
        self.session.as_ref()
    }

    /// Current JWT.
    ///
    /// # Errors
    /// `MissingSession` when the account has no token (never authenticated or
    /// last refresh failed).
    pub fn bearer(&self) -> RegistryResult<String> {
        self.session
            .as_ref()
            .map(|s| s.jwt.clone())
            .ok_or_else(|| RegistryError::MissingSession(self.id().clone()))
    }

    pub fn set_session(&mut self, token: SessionToken) {
        self.session = Some(token);
    }

    pub fn clear_session(&mut self) {
        self.session = None;
    }
}

/// Signs auth challenges and stores the resulting tokens.
pub struct SessionManager {
    api: DynExchangeApi,
    domain: StarkDomain,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(api: DynExchangeApi, domain: StarkDomain, clock: Arc<dyn Clock>) -> Self {
        Self { api, domain, clock }
    }

    /// Authenticate `managed` and replace its token.
    ///
    /// On failure the token is cleared and the error returned; callers do
    /// not retry.
    pub async fn refresh(&self, managed: &mut ManagedAccount) -> RegistryResult<()> {
        match self.authenticate(managed.account()).await {
            Ok(token) => {
                debug!(
                    account = %managed.id(),
                    expires_at = token.expires_at(),
                    "Session refreshed"
                );
                managed.set_session(token);
                Metrics::session_refreshed("ok");
                Ok(())
            }
            Err(e) => {
                warn!(account = %managed.id(), error = %e, "Session refresh failed");
                managed.clear_session();
                Metrics::session_refreshed("error");
                Err(e)
            }
        }
    }

    /// Refresh every account in order. Failures are logged, not returned.
    ///
    /// Returns the number of accounts holding a fresh token.
    pub async fn refresh_all(&self, accounts: &mut [ManagedAccount]) -> usize {
        let mut refreshed = 0;
        for managed in accounts.iter_mut() {
            if self.refresh(managed).await.is_ok() {
                refreshed += 1;
            }
        }
        refreshed
    }

    async fn authenticate(&self, account: &HedgeAccount) -> RegistryResult<SessionToken> {
        let request = AuthRequest::new(self.clock.now_secs());
        let signature = account.sign_message(&self.domain, &request.to_typed()?)?;
        let headers = AuthHeaders {
            account: account.id().to_string(),
            signature: signature.to_wire(),
            timestamp: request.timestamp,
            expiration: request.expiration,
        };
        let jwt = self.api.authenticate(headers).await?;
        Ok(SessionToken::new(jwt, request.expiration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExchange;
    use hedge_signer::{paradex_domain, DerivationParams, Felt, StarkKeyPair};

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            self.0
        }
    }

    fn account(seed: u64) -> HedgeAccount {
        let params = DerivationParams {
            l1_chain_id: 1,
            account_proxy_hash: Felt::from(11u64),
            account_class_hash: Felt::from(22u64),
        };
        HedgeAccount::from_keys(StarkKeyPair::from_private_key(Felt::from(seed)), &params)
            .unwrap()
    }

    fn setup() -> (Arc<MockExchange>, SessionManager) {
        let exchange = Arc::new(MockExchange::new());
        let domain = paradex_domain(exchange.starknet_chain_felt());
        let manager = SessionManager::new(
            exchange.clone(),
            domain,
            Arc::new(FixedClock(1_700_000_000_000)),
        );
        (exchange, manager)
    }

    #[tokio::test]
    async fn test_refresh_stores_token_with_expiry() {
        let (exchange, manager) = setup();
        let acc = account(7);
        exchange.register_account(acc.id(), acc.public_key());
        let mut managed = ManagedAccount::new(acc);

        manager.refresh(&mut managed).await.unwrap();

        let session = managed.session().unwrap();
        assert_eq!(session.expires_at(), 1_700_000_000 + 86_400);
        assert!(!managed.bearer().unwrap().is_empty());
        assert_eq!(exchange.auth_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_token() {
        let (exchange, manager) = setup();
        let acc = account(8);
        let mut managed = ManagedAccount::new(acc.clone());
        manager.refresh(&mut managed).await.unwrap();
        assert!(managed.session().is_some());

        exchange.fail_auth_for(acc.id());
        assert!(manager.refresh(&mut managed).await.is_err());
        assert!(managed.session().is_none());
        assert!(matches!(
            managed.bearer(),
            Err(RegistryError::MissingSession(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_all_counts_successes() {
        let (exchange, manager) = setup();
        let accounts: Vec<_> = (1..=3).map(account).collect();
        exchange.fail_auth_for(accounts[1].id());
        let mut managed: Vec<_> = accounts.into_iter().map(ManagedAccount::new).collect();

        assert_eq!(manager.refresh_all(&mut managed).await, 2);
        assert!(managed[1].session().is_none());
    }

    #[test]
    fn test_token_expiry() {
        let token = SessionToken::new("jwt", 100);
        assert!(!token.is_expired(99));
        assert!(token.is_expired(100));
        assert!(!format!("{token:?}").contains("jwt"));
    }
}

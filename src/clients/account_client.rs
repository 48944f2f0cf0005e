use crate::account_actor::AccountError;
use crate::clients::actor_client::ActorClient;
use crate::clients::lookup::{AccountLookup, Lookup, LookupError};
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{Account, AccountCreate, AccountId, AccountUpdate};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Account actor.
#[derive(Clone)]
pub struct AccountClient {
    inner: ResourceClient<Account>,
}

impl AccountClient {
    pub fn new(inner: ResourceClient<Account>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<Account> for AccountClient {
    type Error = AccountError;

    fn inner(&self) -> &ResourceClient<Account> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => AccountError::NotFound(id),
            FrameworkError::EntityError(inner) => AccountError::ValidationError(inner.to_string()),
            other => AccountError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl AccountClient {
    #[instrument(skip(self))]
    pub async fn create_account(&self, params: AccountCreate) -> Result<AccountId, AccountError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn update_account(
        &self,
        id: AccountId,
        update: AccountUpdate,
    ) -> Result<Account, AccountError> {
        debug!("Sending request");
        self.inner.update(id, update).await.map_err(Self::map_error)
    }
}

#[async_trait]
impl AccountLookup for AccountClient {
    #[instrument(skip(self), fields(account_id = %id))]
    async fn get_account(&self, id: &AccountId) -> Result<Lookup<Account>, LookupError> {
        debug!("Looking up account");
        self.inner
            .get(id.clone())
            .await
            .map(Lookup::from)
            .map_err(|e| LookupError::Transport(e.to_string()))
    }
}

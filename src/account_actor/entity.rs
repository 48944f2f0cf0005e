//! [`ActorEntity`] implementation for [`Account`].

use super::AccountError;
use crate::framework::ActorEntity;
use crate::model::{Account, AccountCreate, AccountId, AccountUpdate};

impl ActorEntity for Account {
    type Id = AccountId;
    type Create = AccountCreate;
    type Update = AccountUpdate;
    type Error = AccountError;

    fn from_create_params(id: AccountId, params: AccountCreate) -> Result<Self, AccountError> {
        Ok(Self {
            id,
            name: params.name,
            email: params.email,
        })
    }

    /// Rejects accounts without a name.
    fn on_create(&mut self) -> Result<(), AccountError> {
        if self.name.trim().is_empty() {
            return Err(AccountError::ValidationError(
                "account name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn on_update(&mut self, update: AccountUpdate) -> Result<(), AccountError> {
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(AccountError::ValidationError(
                    "account name must not be empty".to_string(),
                ));
            }
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        Ok(())
    }
}

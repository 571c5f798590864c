//! Request-scoped batch loaders for the per-user fields of `User`.
//!
//! A list of N users resolves each field with one store read instead of N.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_graphql::dataloader::{DataLoader, Loader};

use crate::models::{AuthenticationProvider, Profile, RoleType};
use crate::services::i18n::Localizer;
use crate::services::store::AccountStore;

const MAX_BATCH_SIZE: usize = 100;
const BATCH_DELAY: Duration = Duration::from_millis(1);

pub struct ProvidersByUser {
    store: Arc<dyn AccountStore>,
    localizer: Localizer,
}

impl Loader<i64> for ProvidersByUser {
    type Value = Vec<AuthenticationProvider>;
    type Error = async_graphql::Error;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        let providers = self
            .store
            .providers_for_users(keys)
            .await
            .map_err(|e| e.into_graphql(&self.localizer))?;

        let mut map: HashMap<i64, Self::Value> = HashMap::new();
        for provider in providers {
            map.entry(provider.user_id).or_default().push(provider);
        }
        Ok(map)
    }
}

pub struct ProfileByUser {
    store: Arc<dyn AccountStore>,
    localizer: Localizer,
}

impl Loader<i64> for ProfileByUser {
    type Value = Profile;
    type Error = async_graphql::Error;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        let profiles = self
            .store
            .profiles_for_users(keys)
            .await
            .map_err(|e| e.into_graphql(&self.localizer))?;

        Ok(profiles.into_iter().map(|p| (p.user_id, p)).collect())
    }
}

pub struct RolesByUser {
    store: Arc<dyn AccountStore>,
    localizer: Localizer,
}

impl Loader<i64> for RolesByUser {
    type Value = Vec<RoleType>;
    type Error = async_graphql::Error;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        let roles = self
            .store
            .roles_for_users(keys)
            .await
            .map_err(|e| e.into_graphql(&self.localizer))?;

        let mut map: HashMap<i64, Self::Value> = HashMap::new();
        for (user_id, role) in roles {
            map.entry(user_id).or_default().push(role);
        }
        Ok(map)
    }
}

/// One set per GraphQL request, so cached rows never outlive it.
pub struct Loaders {
    pub providers: DataLoader<ProvidersByUser>,
    pub profiles: DataLoader<ProfileByUser>,
    pub roles: DataLoader<RolesByUser>,
}

impl Loaders {
    pub fn new(store: &Arc<dyn AccountStore>, localizer: &Localizer) -> Self {
        Self {
            providers: batched(ProvidersByUser {
                store: Arc::clone(store),
                localizer: localizer.clone(),
            }),
            profiles: batched(ProfileByUser {
                store: Arc::clone(store),
                localizer: localizer.clone(),
            }),
            roles: batched(RolesByUser {
                store: Arc::clone(store),
                localizer: localizer.clone(),
            }),
        }
    }
}

fn batched<T: Loader<i64>>(loader: T) -> DataLoader<T> {
    DataLoader::new(loader, tokio::spawn)
        .max_batch_size(MAX_BATCH_SIZE)
        .delay(BATCH_DELAY)
}

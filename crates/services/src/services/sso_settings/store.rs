use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use utils::api::sso_settings::{ProviderId, ProviderSettings};

use crate::services::sso_client::{SettingsLister, SsoSettingsClientError};

/// Client-side cache of provider settings consumed by the forms.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Loads the settings of every provider. Safe to call again while a
    /// previous load is still running.
    async fn load_settings(&self) -> Result<(), SsoSettingsClientError>;

    async fn settings(&self, provider: ProviderId) -> Option<ProviderSettings>;

    async fn is_loading(&self) -> bool;

    /// Replaces the cached settings after a successful save.
    async fn cache(&self, provider: ProviderId, settings: ProviderSettings);
}

#[derive(Debug, Default)]
struct StoreState {
    is_loading: bool,
    /// Bumped after every successful load.
    generation: u64,
    providers: BTreeMap<ProviderId, ProviderSettings>,
}

pub struct SsoSettingsStore {
    lister: Arc<dyn SettingsLister>,
    state: RwLock<StoreState>,
    load_lock: Mutex<()>,
}

impl SsoSettingsStore {
    pub fn new(lister: impl SettingsLister + 'static) -> Self {
        Self {
            lister: Arc::new(lister),
            state: RwLock::new(StoreState::default()),
            load_lock: Mutex::new(()),
        }
    }

    pub async fn providers(&self) -> Vec<ProviderId> {
        self.state.read().await.providers.keys().copied().collect()
    }
}

#[async_trait]
impl SettingsSource for SsoSettingsStore {
    async fn load_settings(&self) -> Result<(), SsoSettingsClientError> {
        let seen = self.state.read().await.generation;
        let _load = self.load_lock.lock().await;
        // A load that finished while we waited already has fresh settings.
        if self.state.read().await.generation != seen {
            debug!("SSO settings loaded by a concurrent call");
            return Ok(());
        }
        self.state.write().await.is_loading = true;

        let result = self.lister.list().await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        let providers = result?;
        state.providers = providers
            .into_iter()
            .filter_map(|entry| match entry.provider_id() {
                Ok(provider) => Some((provider, entry.settings)),
                Err(err) => {
                    debug!(%err, "skipping provider without a settings form");
                    None
                }
            })
            .collect();
        state.generation += 1;
        debug!(count = state.providers.len(), "loaded SSO settings");
        Ok(())
    }

    async fn settings(&self, provider: ProviderId) -> Option<ProviderSettings> {
        self.state.read().await.providers.get(&provider).cloned()
    }

    async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    async fn cache(&self, provider: ProviderId, settings: ProviderSettings) {
        self.state.write().await.providers.insert(provider, settings);
    }
}

use std::{collections::BTreeMap, sync::Arc};

use services::services::sso_settings::registry;
use tokio::sync::RwLock;
use utils::api::sso_settings::{ProviderId, ProviderSettings, SsoProvider};

/// In-memory SSO settings, one entry per supported provider.
#[derive(Clone)]
pub struct AppState {
    settings: Arc<RwLock<BTreeMap<ProviderId, ProviderSettings>>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Every provider starts disabled with all of its form fields empty.
    pub fn new() -> Self {
        let settings = ProviderId::ALL
            .into_iter()
            .map(|provider| {
                let empty = registry::fields_for(provider)
                    .iter()
                    .fold(ProviderSettings::new(false), |settings, name| {
                        settings.with(*name, "")
                    });
                (provider, empty)
            })
            .collect();
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: BTreeMap<ProviderId, ProviderSettings>) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    pub async fn list(&self) -> Vec<SsoProvider> {
        self.settings
            .read()
            .await
            .iter()
            .map(|(provider, settings)| SsoProvider {
                provider: provider.to_string(),
                settings: settings.clone(),
            })
            .collect()
    }

    pub async fn get(&self, provider: ProviderId) -> Option<ProviderSettings> {
        self.settings.read().await.get(&provider).cloned()
    }

    pub async fn put(&self, provider: ProviderId, settings: ProviderSettings) {
        self.settings.write().await.insert(provider, settings);
    }
}

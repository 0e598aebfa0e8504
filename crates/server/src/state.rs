use bookopt_core::{Config, SanitizedConfig};

use crate::signing::UrlSigner;
use crate::storage::BlobStore;

/// Shared application state
pub struct AppState {
    config: Config,
    store: BlobStore,
    signer: UrlSigner,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = BlobStore::new(&config.storage);
        let signer = UrlSigner::new(
            config.storage.signing_key.clone(),
            config.storage.signed_url_ttl_minutes,
        );
        Self {
            config,
            store,
            signer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Base URL used in signed links.
    pub fn public_base_url(&self) -> String {
        self.config.server.public_base_url()
    }
}

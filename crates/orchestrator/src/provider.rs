//! Model provider resolution per company.
//!
//! The platform provider is built once, on first use, and shared. A company that
//! brings its own key gets a fresh provider for each call; the shared one is never
//! reconfigured.

use std::sync::{Arc, Mutex, OnceLock};

use brain_core::{Brain, BrainError};
use database::Company;
use openai_brain::{OpenAiBrain, OpenAiBrainConfig};
use tracing::{debug, info};

use crate::crypto::{CryptoError, KeyCipher};
use crate::error::OrchestratorError;

/// Builds model providers.
pub trait ProviderFactory: Send + Sync {
    /// The shared platform provider.
    fn platform(&self) -> Result<Arc<dyn Brain>, BrainError>;

    /// A short-lived provider authenticated with a company's key.
    fn with_key(&self, api_key: &str) -> Result<Arc<dyn Brain>, BrainError>;
}

/// OpenAI providers built from one base configuration.
pub struct OpenAiProviders {
    base: OpenAiBrainConfig,
    platform: OnceLock<Arc<dyn Brain>>,
}

impl OpenAiProviders {
    pub fn new(base: OpenAiBrainConfig) -> Self {
        Self {
            base,
            platform: OnceLock::new(),
        }
    }

    /// Settings from `OPENAI_*`; the platform key may be absent.
    pub fn from_env() -> Self {
        Self::new(OpenAiBrainConfig::from_env_without_key())
    }
}

impl ProviderFactory for OpenAiProviders {
    fn platform(&self) -> Result<Arc<dyn Brain>, BrainError> {
        if let Some(brain) = self.platform.get() {
            return Ok(brain.clone());
        }

        let brain: Arc<dyn Brain> = Arc::new(OpenAiBrain::new(self.base.clone())?);
        info!("Platform model provider initialized");
        Ok(self.platform.get_or_init(|| brain).clone())
    }

    fn with_key(&self, api_key: &str) -> Result<Arc<dyn Brain>, BrainError> {
        Ok(Arc::new(OpenAiBrain::new(self.base.with_api_key(api_key))?))
    }
}

/// Hands out one provider for every call and remembers which company keys were used.
pub struct FixedProviders {
    brain: Arc<dyn Brain>,
    keys: Mutex<Vec<String>>,
}

impl FixedProviders {
    pub fn new(brain: Arc<dyn Brain>) -> Self {
        Self {
            brain,
            keys: Mutex::new(Vec::new()),
        }
    }

    /// Company keys requested so far, oldest first.
    pub fn keys_used(&self) -> Vec<String> {
        self.keys.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ProviderFactory for FixedProviders {
    fn platform(&self) -> Result<Arc<dyn Brain>, BrainError> {
        Ok(self.brain.clone())
    }

    fn with_key(&self, api_key: &str) -> Result<Arc<dyn Brain>, BrainError> {
        self.keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(api_key.to_string());
        Ok(self.brain.clone())
    }
}

/// A provider chosen for one company.
pub struct ResolvedProvider {
    pub brain: Arc<dyn Brain>,
    pub uses_own_key: bool,
}

/// Picks the platform provider or the company's own.
#[derive(Clone)]
pub struct ProviderResolver {
    factory: Arc<dyn ProviderFactory>,
    cipher: Option<KeyCipher>,
}

impl ProviderResolver {
    pub fn new(factory: Arc<dyn ProviderFactory>, cipher: Option<KeyCipher>) -> Self {
        Self { factory, cipher }
    }

    /// Provider for a company, decrypting its key when it has one.
    pub fn resolve(&self, company: &Company) -> Result<ResolvedProvider, OrchestratorError> {
        let stored = company
            .openai_api_key
            .as_deref()
            .filter(|_| company.uses_own_key());

        match stored {
            Some(stored) => {
                let cipher = self.cipher.as_ref().ok_or(CryptoError::MissingKey)?;
                let api_key = cipher.open(stored)?;
                debug!(company_id = %company.id, "Using company-owned provider key");
                Ok(ResolvedProvider {
                    brain: self.factory.with_key(&api_key)?,
                    uses_own_key: true,
                })
            }
            None => Ok(ResolvedProvider {
                brain: self.factory.platform()?,
                uses_own_key: false,
            }),
        }
    }
}

//! Model id to adapter mapping

use llm_eval_core::{ModelConfig, ModelId, ProviderKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::chat::ChatCompletionProvider;
use crate::config::ProviderSettings;
use crate::error::ProviderResult;
use crate::messages::MessagesProvider;
use crate::LlmProvider;

/// Build the adapter for one model configuration.
///
/// Returns `Ok(None)` when the provider name is not one of the supported
/// [`ProviderKind`]s. A `base_url` on the model config wins over the one in
/// `settings`.
pub fn build_provider(
    config: &ModelConfig,
    settings: &ProviderSettings,
) -> ProviderResult<Option<Arc<dyn LlmProvider>>> {
    let Some(kind) = config.provider_kind() else {
        return Ok(None);
    };

    let mut settings = settings.clone();
    if let Some(base_url) = &config.base_url {
        settings.base_url = Some(base_url.clone());
    }

    let provider: Arc<dyn LlmProvider> = match kind {
        ProviderKind::OpenAI => Arc::new(ChatCompletionProvider::new(
            config.api_key.clone(),
            config.model_version.clone(),
            &settings,
        )?),
        ProviderKind::Anthropic => Arc::new(MessagesProvider::new(
            config.api_key.clone(),
            config.model_version.clone(),
            &settings,
        )?),
    };

    Ok(Some(provider))
}

/// Immutable mapping from model id to adapter.
///
/// Built once, then shared read-only by every concurrent test-case task.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ModelId, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Build adapters for every configuration with default transport settings
    pub fn from_configs(configs: impl IntoIterator<Item = (ModelId, ModelConfig)>) -> Self {
        Self::from_configs_with(configs, &ProviderSettings::default())
    }

    /// Build adapters for every configuration.
    ///
    /// Unrecognized provider names and adapters that fail to build are skipped
    /// with a warning; runs against those models later fail as not configured.
    pub fn from_configs_with(
        configs: impl IntoIterator<Item = (ModelId, ModelConfig)>,
        settings: &ProviderSettings,
    ) -> Self {
        let mut builder = Self::builder();

        for (model_id, config) in configs {
            match build_provider(&config, settings) {
                Ok(Some(provider)) => {
                    debug!(
                        model_id = %model_id,
                        provider = provider.provider_name(),
                        model = provider.model(),
                        "Registered provider"
                    );
                    builder = builder.register(model_id, provider);
                }
                Ok(None) => {
                    warn!(
                        model_id = %model_id,
                        provider = %config.provider,
                        "Skipping model with unrecognized provider"
                    );
                }
                Err(e) => {
                    warn!(model_id = %model_id, error = %e, "Skipping model whose adapter failed to build");
                }
            }
        }

        builder.build()
    }

    pub fn get(&self, model_id: &ModelId) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(model_id).cloned()
    }

    pub fn contains(&self, model_id: &ModelId) -> bool {
        self.providers.contains_key(model_id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut models: Vec<_> = self.providers.keys().map(ModelId::as_str).collect();
        models.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("models", &models)
            .finish()
    }
}

/// Collects adapters before freezing them into a [`ProviderRegistry`]
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: HashMap<ModelId, Arc<dyn LlmProvider>>,
}

impl ProviderRegistryBuilder {
    pub fn register(mut self, model_id: ModelId, provider: Arc<dyn LlmProvider>) -> Self {
        self.providers.insert(model_id, provider);
        self
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: self.providers,
        }
    }
}

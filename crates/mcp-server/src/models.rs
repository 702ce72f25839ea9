//! Registry of model ids accepted by the remote API.
//!
//! Readers get an `Arc` to an immutable [`ModelSnapshot`]; a refresh builds a complete new
//! snapshot off-lock and swaps the pointer under a short write lock, so readers never see a
//! partial set and are never blocked behind the network call.

use deepseek_api::{ApiError, DeepseekApi, RemoteModel, RetryPolicy};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;

/// Installed when the first refresh fails, so validation still has something to go on.
pub const FALLBACK_MODELS: &[(&str, &str)] = &[
    ("deepseek-chat", "General-purpose chat model (DeepSeek-V3)"),
    ("deepseek-reasoner", "Reasoning model with chain-of-thought (DeepSeek-R1)"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl ModelDescriptor {
    pub fn from_remote(model: &RemoteModel) -> Self {
        let owner = if model.owned_by.trim().is_empty() {
            "unknown"
        } else {
            model.owned_by.trim()
        };
        Self {
            id: model.id.clone(),
            name: display_name(&model.id),
            description: format!("Model provided by {owner}"),
        }
    }
}

/// `deepseek-chat` -> `Deepseek Chat`.
pub fn display_name(model_id: &str) -> String {
    model_id
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Point-in-time set of known models, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSnapshot {
    models: BTreeMap<String, ModelDescriptor>,
}

impl ModelSnapshot {
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        Self {
            models: descriptors
                .into_iter()
                .map(|descriptor| (descriptor.id.clone(), descriptor))
                .collect(),
        }
    }

    pub fn fallback() -> Self {
        Self::from_descriptors(FALLBACK_MODELS.iter().map(|(id, description)| {
            ModelDescriptor {
                id: (*id).to_string(),
                name: display_name(id),
                description: (*description).to_string(),
            }
        }))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to fetch models from DeepSeek API: {0}")]
    Refresh(#[from] ApiError),

    #[error("model id must not be empty")]
    EmptyModelId,

    #[error("unknown model id \"{id}\" (available: {})", format_available(available))]
    UnknownModel { id: String, available: Vec<String> },
}

fn format_available(ids: &[String]) -> String {
    if ids.is_empty() {
        "none".to_string()
    } else {
        ids.join(", ")
    }
}

pub struct ModelRegistry {
    api: Arc<dyn DeepseekApi>,
    timeout: Duration,
    retry: RetryPolicy,
    snapshot: RwLock<Arc<ModelSnapshot>>,
    // Serializes refreshes; never held by readers.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl ModelRegistry {
    pub fn new(api: Arc<dyn DeepseekApi>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            api,
            timeout,
            retry,
            snapshot: RwLock::new(Arc::new(ModelSnapshot::default())),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<ModelSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch the model list and swap it in. Returns the number of models discovered.
    ///
    /// On failure the current snapshot stays authoritative; if there is none yet, the
    /// built-in fallback list is installed. The error is still returned to the caller.
    pub async fn refresh(&self) -> Result<usize, RegistryError> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<usize, RegistryError> {
        log::info!("Discovering available DeepSeek models from API");
        let api = self.api.as_ref();
        match self.retry.run(self.timeout, move || api.list_models()).await {
            Ok(list) => {
                let next = ModelSnapshot::from_descriptors(
                    list.data.iter().map(ModelDescriptor::from_remote),
                );
                let count = next.len();
                self.install(next);
                log::info!("Discovered {count} DeepSeek models");
                Ok(count)
            }
            Err(err) => {
                if self.snapshot().is_empty() {
                    log::warn!("Failed to discover DeepSeek models, using fallback list: {err}");
                    self.install(ModelSnapshot::fallback());
                } else {
                    log::warn!("Failed to refresh DeepSeek models, keeping previous list: {err}");
                }
                Err(RegistryError::Refresh(err))
            }
        }
    }

    /// Refresh only if the snapshot is still empty once the gate is held, so concurrent
    /// callers that all observed an empty registry trigger a single remote call.
    pub async fn refresh_if_empty(&self) -> Result<(), RegistryError> {
        if !self.snapshot().is_empty() {
            return Ok(());
        }
        let _gate = self.refresh_gate.lock().await;
        if !self.snapshot().is_empty() {
            return Ok(());
        }
        self.refresh_locked().await.map(|_| ())
    }

    pub async fn validate(&self, model_id: &str) -> Result<(), RegistryError> {
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(RegistryError::EmptyModelId);
        }

        if let Err(err) = self.refresh_if_empty().await {
            log::warn!("Implicit model refresh failed during validation: {err}");
        }

        let snapshot = self.snapshot();
        if snapshot.contains(model_id) {
            Ok(())
        } else {
            Err(RegistryError::UnknownModel {
                id: model_id.to_string(),
                available: snapshot.ids().map(str::to_string).collect(),
            })
        }
    }

    fn install(&self, next: ModelSnapshot) {
        let next = Arc::new(next);
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }
}

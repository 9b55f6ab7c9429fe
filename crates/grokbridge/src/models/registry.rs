use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// What the bridge knows about one backend model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    #[serde(default)]
    pub is_video_model: bool,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, is_video_model: bool) -> Self {
        Self {
            id: id.into(),
            is_video_model,
        }
    }
}

/// Read-only source of model capabilities
pub trait ModelRegistry: Send + Sync {
    /// All model ids, in the registry's iteration order
    fn model_ids(&self) -> Result<Vec<String>>;

    /// Look up one model by id
    fn descriptor(&self, id: &str) -> Result<ModelDescriptor>;
}

/// The compiled-in model table
#[derive(Debug, Clone)]
pub struct StaticModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl StaticModelRegistry {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }
}

impl Default for StaticModelRegistry {
    fn default() -> Self {
        Self::new(vec![
            ModelDescriptor::new("grok-3-fast", false),
            ModelDescriptor::new("grok-4-fast", false),
            ModelDescriptor::new("grok-4-fast-expert", false),
            ModelDescriptor::new("grok-4-expert", false),
            ModelDescriptor::new("grok-4-heavy", false),
            ModelDescriptor::new("grok-imagine-0.9", true),
        ])
    }
}

impl ModelRegistry for StaticModelRegistry {
    fn model_ids(&self) -> Result<Vec<String>> {
        Ok(self.models.iter().map(|m| m.id.clone()).collect())
    }

    fn descriptor(&self, id: &str) -> Result<ModelDescriptor> {
        self.models
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown model: {}", id))
    }
}

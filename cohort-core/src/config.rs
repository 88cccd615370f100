// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::error::{CohortError, CohortResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Cohort configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CohortConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub llm: LLMConfig,
    #[serde(default)]
    pub embedder: EmbedderConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
}

/// Which graph store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphBackend {
    #[default]
    Neo4j,
    Memory,
}

impl std::str::FromStr for GraphBackend {
    type Err = CohortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "neo4j" => Ok(GraphBackend::Neo4j),
            "memory" => Ok(GraphBackend::Memory),
            other => Err(CohortError::Config(format!("Unknown graph backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub backend: GraphBackend,

    /// Bolt URI (e.g., "bolt://localhost:7687")
    pub uri: Option<String>,

    #[serde(default = "default_neo4j_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Target database; server default when unset
    pub database: Option<String>,

    /// Name used for the temporary clustering projection
    #[serde(default = "default_projection_name")]
    pub projection_name: String,

    /// JSON snapshot file for the in-memory backend
    pub snapshot_path: Option<PathBuf>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: GraphBackend::default(),
            uri: None,
            user: default_neo4j_user(),
            password: String::new(),
            database: None,
            projection_name: default_projection_name(),
            snapshot_path: None,
        }
    }
}

/// Hosted language-model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    #[default]
    OpenAI,
    Anthropic,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LLMConfig {
    #[serde(default)]
    pub provider: LLMProvider,

    pub api_key: Option<String>,

    /// Override for OpenAI-compatible endpoints
    pub base_url: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: None,
            base_url: None,
            model: default_llm_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedderConfig {
    /// Falls back to `llm.api_key` when unset and the provider is OpenAI
    pub api_key: Option<String>,

    /// Falls back to `llm.base_url` when unset and the provider is OpenAI
    pub base_url: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_embedding_model(),
        }
    }
}

/// In-process clustering algorithm used by the memory backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusteringAlgorithm {
    #[default]
    Leiden,
    LabelPropagation,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusteringConfig {
    #[serde(default)]
    pub algorithm: ClusteringAlgorithm,

    /// Leiden resolution (higher = smaller communities)
    #[serde(default = "default_resolution")]
    pub resolution: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            algorithm: ClusteringAlgorithm::default(),
            resolution: default_resolution(),
            max_iterations: default_max_iterations(),
            seed: None,
        }
    }
}

// Default values
fn default_neo4j_user() -> String {
    "neo4j".to_string()
}

fn default_projection_name() -> String {
    "communities".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_resolution() -> f64 {
    1.0
}

fn default_max_iterations() -> usize {
    10
}

impl CohortConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> CohortResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - NEO4J_URI, NEO4J_USER, NEO4J_PASSWORD: graph connection
    /// - COHORT_GRAPH_BACKEND: `neo4j` or `memory`
    /// - COHORT_SNAPSHOT_PATH: snapshot file for the memory backend
    /// - OPENAI_API_KEY, OPENAI_BASE_URL, MODEL_NAME: OpenAI provider
    /// - ANTHROPIC_API_KEY: selects the Anthropic provider when no OpenAI key is set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load configuration with priority: env > file > defaults
    pub fn load(config_file: Option<PathBuf>) -> CohortResult<Self> {
        let mut config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Override fields whose environment variable is explicitly set
    fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = var("COHORT_GRAPH_BACKEND") {
            match backend.parse() {
                Ok(b) => self.graph.backend = b,
                Err(e) => tracing::warn!("Ignoring COHORT_GRAPH_BACKEND: {}", e),
            }
        }
        if let Some(uri) = var("NEO4J_URI") {
            self.graph.uri = Some(uri);
        }
        if let Some(user) = var("NEO4J_USER") {
            self.graph.user = user;
        }
        if let Some(password) = var("NEO4J_PASSWORD") {
            self.graph.password = password;
        }
        if let Some(path) = var("COHORT_SNAPSHOT_PATH") {
            self.graph.snapshot_path = Some(PathBuf::from(path));
        }

        if let Some(key) = var("OPENAI_API_KEY") {
            self.llm.provider = LLMProvider::OpenAI;
            self.llm.api_key = Some(key);
        } else if let Some(key) = var("ANTHROPIC_API_KEY") {
            self.llm.provider = LLMProvider::Anthropic;
            self.llm.api_key = Some(key);
        }
        // Only the OpenAI chat client and the embedder speak the OpenAI API
        if let Some(base_url) = var("OPENAI_BASE_URL") {
            match self.llm.provider {
                LLMProvider::OpenAI => self.llm.base_url = Some(base_url),
                LLMProvider::Anthropic => self.embedder.base_url = Some(base_url),
            }
        }
        if let Some(model) = var("MODEL_NAME") {
            self.llm.model = model;
        }
    }

    /// `[llm]` settings the embedder may inherit
    ///
    /// Embeddings always go to an OpenAI-compatible endpoint, so only an
    /// OpenAI language-model section is shared.
    fn shared_llm(&self) -> Option<&LLMConfig> {
        match self.llm.provider {
            LLMProvider::OpenAI => Some(&self.llm),
            LLMProvider::Anthropic => None,
        }
    }

    /// Key used by the embedder
    pub fn embedder_api_key(&self) -> Option<&str> {
        self.embedder
            .api_key
            .as_deref()
            .or_else(|| self.shared_llm()?.api_key.as_deref())
    }

    /// Base URL used by the embedder
    pub fn embedder_base_url(&self) -> Option<&str> {
        self.embedder
            .base_url
            .as_deref()
            .or_else(|| self.shared_llm()?.base_url.as_deref())
    }

    /// Validate configuration
    pub fn validate(&self) -> CohortResult<()> {
        if self.graph.backend == GraphBackend::Neo4j && self.graph.uri.is_none() {
            return Err(CohortError::Config(
                "Neo4j backend selected but no URI configured".to_string(),
            ));
        }

        if self.llm.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(CohortError::Config(format!(
                "No API key configured for LLM provider {:?}",
                self.llm.provider
            )));
        }

        if self.embedder_api_key().map_or(true, str::is_empty) {
            return Err(CohortError::Config(format!(
                "No embedder API key configured; [embedder] api_key is required with LLM provider {:?}",
                self.llm.provider
            )));
        }

        if self.clustering.resolution <= 0.0 {
            return Err(CohortError::Config(
                "Clustering resolution must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

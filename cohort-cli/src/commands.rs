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

use crate::Commands;
use anyhow::{bail, Context, Result};
use cohort_community::CommunityEngine;
use cohort_core::{CohortConfig, EntityNode, GraphBackend, LLMProvider};
use cohort_graph::{detection, GraphStore, MemoryGraphStore, Neo4jGraphStore};
use cohort_llm::{AnthropicClient, EmbeddingClient, LLMClient, OpenAIClient};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

enum Backend {
    Memory(Arc<MemoryGraphStore>),
    Neo4j(Arc<Neo4jGraphStore>),
}

impl Backend {
    fn store(&self) -> Arc<dyn GraphStore> {
        match self {
            Backend::Memory(store) => store.clone(),
            Backend::Neo4j(store) => store.clone(),
        }
    }
}

/// Wired-up store, providers and engine
pub struct Runtime {
    backend: Backend,
    engine: CommunityEngine,
}

impl Runtime {
    pub async fn connect(config: &CohortConfig) -> Result<Self> {
        let backend = match config.graph.backend {
            GraphBackend::Memory => {
                let detector = detection::from_config(&config.clustering);
                let store = match config.graph.snapshot_path {
                    Some(ref path) => MemoryGraphStore::with_persistence(path, detector)
                        .with_context(|| format!("Failed to open snapshot {}", path.display()))?,
                    None => MemoryGraphStore::with_detector(detector),
                };
                Backend::Memory(Arc::new(store))
            }
            GraphBackend::Neo4j => {
                let store = Neo4jGraphStore::connect(&config.graph)
                    .await
                    .context("Failed to connect to Neo4j")?;
                Backend::Neo4j(Arc::new(store))
            }
        };
        info!(backend = ?config.graph.backend, "Graph store ready");

        let engine = CommunityEngine::new(backend.store(), llm_client(config), embedder(config))
            .with_projection_name(config.graph.projection_name.clone());

        Ok(Self { backend, engine })
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Build { no_reset } => {
                let report = self.engine.rebuild(!no_reset).await?;
                print_json(&report)?;
            }
            Commands::Reset => {
                let deleted = self.engine.reset_communities().await?;
                print_json(&serde_json::json!({ "deleted": deleted }))?;
            }
            Commands::Update { entity_uuid } => {
                let entity = self.engine.store().get_entity(&entity_uuid).await?;
                let community = self.engine.update_community(&entity).await?;
                print_json(&community)?;
            }
            Commands::Detect { entity_uuid } => {
                let entity = self.engine.store().get_entity(&entity_uuid).await?;
                let assignment = self.engine.determine_entity_community(&entity).await?;
                print_json(&assignment)?;
            }
            Commands::Refresh { community_uuid } => match community_uuid {
                Some(uuid) => print_json(&self.engine.refresh_community(&uuid).await?)?,
                None => print_json(&self.engine.refresh_communities().await?)?,
            },
            Commands::AddEntity {
                name,
                group_id,
                uuid,
                summary,
                no_update,
            } => {
                let mut entity = EntityNode::new(name, group_id).with_summary(summary);
                if let Some(uuid) = uuid {
                    entity = entity.with_uuid(uuid);
                }
                let outcome = self.engine.add_entity(entity, !no_update).await?;
                print_json(&outcome)?;
            }
            Commands::Link { source, target } => match self.backend {
                Backend::Memory(ref store) => {
                    store.add_relationship(&source, &target).await?;
                    println!("✓ Linked {} -> {}", source, target);
                }
                Backend::Neo4j(_) => bail!("link is only supported by the memory backend"),
            },
        }

        if let Backend::Memory(ref store) = self.backend {
            store.save_to_disk().await?;
        }
        Ok(())
    }
}

fn llm_client(config: &CohortConfig) -> Arc<dyn LLMClient> {
    let api_key = config.llm.api_key.clone().unwrap_or_default();
    let model = config.llm.model.clone();
    match config.llm.provider {
        LLMProvider::OpenAI => {
            let mut client = OpenAIClient::new(api_key, model);
            if let Some(ref base_url) = config.llm.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Arc::new(client)
        }
        LLMProvider::Anthropic => {
            let mut client = AnthropicClient::new(api_key, model);
            if let Some(ref base_url) = config.llm.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Arc::new(client)
        }
    }
}

/// Embeddings always go through an OpenAI-compatible endpoint
fn embedder(config: &CohortConfig) -> Arc<dyn EmbeddingClient> {
    let api_key = config.embedder_api_key().unwrap_or_default().to_string();
    let mut client = OpenAIClient::new(api_key, config.llm.model.clone())
        .with_embedding_model(config.embedder.model.clone());
    if let Some(base_url) = config.embedder_base_url() {
        client = client.with_base_url(base_url.to_string());
    }
    Arc::new(client)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

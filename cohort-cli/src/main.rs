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

//! Cohort CLI
//!
//! Command-line interface for building and maintaining communities.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cohort_core::CohortConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cohort")]
#[command(author, version, about = "Community detection over an entity graph", long_about = None)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, env = "COHORT_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cluster the graph and persist one community per cluster
    Build {
        /// Keep existing communities instead of deleting them first
        #[arg(long)]
        no_reset: bool,
    },

    /// Delete every community and its membership edges
    Reset,

    /// Fold an entity into its community
    Update {
        /// Entity UUID
        entity_uuid: String,
    },

    /// Show which community an entity belongs to or would join
    Detect {
        /// Entity UUID
        entity_uuid: String,
    },

    /// Recompute community summaries from their members
    Refresh {
        /// Community UUID (all communities when omitted)
        community_uuid: Option<String>,
    },

    /// Save an entity with a name embedding
    AddEntity {
        #[arg(long)]
        name: String,

        #[arg(long)]
        group_id: String,

        /// Entity UUID (generated when omitted)
        #[arg(long)]
        uuid: Option<String>,

        #[arg(long, default_value = "")]
        summary: String,

        /// Skip community assignment
        #[arg(long)]
        no_update: bool,
    },

    /// Relate two entities (memory backend only)
    Link { source: String, target: String },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cohort=info,cohort_community=info,cohort_graph=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = CohortConfig::load(cli.config).context("Failed to load configuration")?;
    config.validate()?;

    let runtime = commands::Runtime::connect(&config).await?;
    runtime.run(cli.command).await
}

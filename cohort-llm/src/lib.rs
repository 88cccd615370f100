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

//! Language-model and embedding clients
//!
//! The community engine only needs two things from hosted models: a JSON
//! completion that returns one text field, and an embedding vector for a
//! community name. Both sit behind traits so tests can swap in mocks.

pub mod client;
pub mod prompts;
pub mod providers;

pub use client::{EmbedError, EmbeddingClient, LLMClient, LLMError, LLMResponse, Message, TokenUsage};
pub use providers::{AnthropicClient, OpenAIClient};

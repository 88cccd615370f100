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

//! Hierarchical summarization
//!
//! Collapses N summaries into one with pairwise language-model calls so no
//! single prompt ever holds more than two summaries.
//!
//! ```text
//! round 1:  [a, b, c, d, e]  ->  carry e, pair (a,d) (b,c)  ->  [ad, bc, e]
//! round 2:  [ad, bc, e]      ->  carry e, pair (ad,bc)      ->  [adbc, e]
//! round 3:  [adbc, e]        ->  pair (adbc, e)             ->  [adbce]
//! ```
//!
//! Pairing is first half against second half, and the carried element is
//! always the positional last. The result depends on input order.

use cohort_core::{CohortError, CohortResult};
use cohort_llm::prompts::{self, DESCRIPTION_KEY, SUMMARY_KEY};
use cohort_llm::LLMClient;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

/// Split one reduction round into pairs plus the carried-forward element
pub fn split_round(mut items: Vec<String>) -> (Vec<(String, String)>, Option<String>) {
    let carried = if items.len() % 2 == 1 { items.pop() } else { None };

    let second = items.split_off(items.len() / 2);
    (items.into_iter().zip(second).collect(), carried)
}

/// Pairwise summary reducer backed by a language model
#[derive(Clone)]
pub struct HierarchicalSummarizer {
    llm: Arc<dyn LLMClient>,
}

impl HierarchicalSummarizer {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Merge two summaries into one; an empty model result yields ""
    pub async fn summarize_pair(&self, left: &str, right: &str) -> CohortResult<String> {
        let response = self
            .llm
            .generate_response(prompts::summarize_pair(&[left, right]))
            .await?;
        Ok(response.text_field(SUMMARY_KEY)?)
    }

    /// Short descriptive label for a summary
    pub async fn name_from_summary(&self, summary: &str) -> CohortResult<String> {
        let response = self
            .llm
            .generate_response(prompts::summary_description(summary))
            .await?;
        Ok(response.text_field(DESCRIPTION_KEY)?)
    }

    /// Reduce an ordered sequence of summaries to one
    pub async fn reduce(&self, summaries: Vec<String>) -> CohortResult<String> {
        if summaries.is_empty() {
            return Err(CohortError::EmptyInput);
        }

        let mut current = summaries;
        let mut round = 0;
        while current.len() > 1 {
            round += 1;
            let (pairs, carried) = split_round(current);
            debug!(
                round,
                pairs = pairs.len(),
                carried = carried.is_some(),
                "Summarization round"
            );

            let mut merged = try_join_all(
                pairs
                    .iter()
                    .map(|(left, right)| self.summarize_pair(left, right)),
            )
            .await?;
            merged.extend(carried);
            current = merged;
        }

        Ok(current.pop().unwrap_or_default())
    }
}

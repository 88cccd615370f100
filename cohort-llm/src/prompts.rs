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

//! Prompt templates for community summaries

use crate::client::Message;

/// Response key holding a merged summary
pub const SUMMARY_KEY: &str = "summary";

/// Response key holding a short description/name
pub const DESCRIPTION_KEY: &str = "description";

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that combines summaries. Respond only with valid JSON.";

const SUMMARIZE_PAIR_TEMPLATE: &str = r#"Synthesize the information from the following summaries into a single succinct summary.
Summaries must be under 250 words.

<SUMMARIES>
{{SUMMARIES}}
</SUMMARIES>

Respond in JSON format:
{"summary": "<the combined summary>"}"#;

const DESCRIPTION_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that describes provided contents in a single sentence. Respond only with valid JSON.";

const SUMMARY_DESCRIPTION_TEMPLATE: &str = r#"Create a short one sentence description of the summary that explains what kind of information is summarized.
Keep it brief; it is used as the name of a group of related entities.

<SUMMARY>
{{SUMMARY}}
</SUMMARY>

Respond in JSON format:
{"description": "<one sentence description>"}"#;

/// Build the messages asking for one summary that merges `summaries`
pub fn summarize_pair(summaries: &[&str]) -> Vec<Message> {
    let context: Vec<serde_json::Value> = summaries
        .iter()
        .map(|s| serde_json::json!({ "summary": s }))
        .collect();
    let rendered =
        serde_json::to_string_pretty(&context).unwrap_or_else(|_| "[]".to_string());

    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(SUMMARIZE_PAIR_TEMPLATE.replace("{{SUMMARIES}}", &rendered)),
    ]
}

/// Build the messages asking for a short description of `summary`
pub fn summary_description(summary: &str) -> Vec<Message> {
    let rendered = serde_json::to_string(summary).unwrap_or_default();

    vec![
        Message::system(DESCRIPTION_SYSTEM_PROMPT),
        Message::user(SUMMARY_DESCRIPTION_TEMPLATE.replace("{{SUMMARY}}", &rendered)),
    ]
}

//! vector_search: code snippet lookup against the search index

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::ToolTrait;

const MAX_TOP: u32 = 50;

/// Queries the snippet index over HTTP
pub struct VectorSearchTool {
    endpoint: String,
    api_key: String,
    top: u32,
}

impl VectorSearchTool {
    /// Missing values fall back to `VECTOR_SEARCH_ENDPOINT` / `VECTOR_SEARCH_API_KEY`
    pub fn new(endpoint: Option<String>, api_key: Option<String>, top: u32) -> Self {
        let endpoint = endpoint
            .filter(|e| !e.is_empty())
            .or_else(|| std::env::var(stockpicker_config::SEARCH_ENDPOINT_VAR).ok())
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string();
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(stockpicker_config::SEARCH_API_KEY_VAR).ok())
            .unwrap_or_default();
        Self {
            endpoint,
            api_key,
            top: top.clamp(1, MAX_TOP),
        }
    }

    pub fn from_config(config: &stockpicker_config::Config) -> Self {
        Self::new(
            Some(config.search.endpoint.clone()),
            Some(config.search.api_key.clone()),
            config.search.top,
        )
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty()
    }
}

#[derive(Deserialize)]
struct VectorSearchArgs {
    query: String,
    top: Option<u32>,
}

#[async_trait]
impl ToolTrait for VectorSearchTool {
    fn name(&self) -> &str {
        "vector_search"
    }

    fn description(&self) -> &str {
        "Search the code snippet database for financial and investment related code. Returns matching snippets with their source paths."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Natural language search query" },
                "top": { "type": "integer", "description": "Number of snippets to return (1-50)", "minimum": 1, "maximum": MAX_TOP }
            },
            "required": ["query"]
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        if self.endpoint.is_empty() {
            return Ok("Error: vector search endpoint not configured".to_string());
        }
        let args: VectorSearchArgs = serde_json::from_value(args)?;
        let top = args.top.unwrap_or(self.top).clamp(1, MAX_TOP);
        debug!("◆ VECTOR SEARCH: {} (top {})", args.query, top);

        let client = reqwest::Client::new();
        let mut request = client
            .post(format!("{}/search", self.endpoint))
            .json(&json!({ "search": &args.query, "top": top }))
            .timeout(Duration::from_secs(30));
        if !self.api_key.is_empty() {
            request = request.header("api-key", &self.api_key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(format!("Error: Search API returned {}", status));
        }

        let data: serde_json::Value = response.json().await?;
        let hits = match data.get("value").and_then(|v| v.as_array()) {
            Some(hits) if !hits.is_empty() => hits,
            _ => return Ok(format!("No results for: {}", args.query)),
        };

        let mut lines = vec![format!("Results for: {}", args.query)];
        for (i, hit) in hits.iter().take(top as usize).enumerate() {
            let path = hit
                .get("path")
                .or_else(|| hit.get("source"))
                .and_then(|p| p.as_str())
                .unwrap_or("unknown");
            let content = hit
                .get("content")
                .or_else(|| hit.get("chunk"))
                .and_then(|c| c.as_str())
                .unwrap_or("");

            match hit.get("@search.score").and_then(|s| s.as_f64()) {
                Some(score) => lines.push(format!("{}. {} (score {:.2})", i + 1, path, score)),
                None => lines.push(format!("{}. {}", i + 1, path)),
            }
            if !content.is_empty() {
                lines.push(format!("```\n{}\n```", content.trim_end()));
            }
        }
        Ok(lines.join("\n"))
    }
}

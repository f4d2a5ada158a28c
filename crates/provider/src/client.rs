//! HTTP client for the hosted agent service

use crate::*;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

/// Agent service reached over its REST API
pub struct AgentsClient {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<ThreadMessage>,
}

impl AgentsClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            endpoint,
            api_key: api_key.into(),
            api_version: api_version.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .query(&[("api-version", self.api_version.as_str())])
            .header("Content-Type", "application/json");
        if self.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.api_key)
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.prepare(request).send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }

        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AgentService for AgentsClient {
    async fn create_agent(&self, request: CreateAgent) -> Result<Agent> {
        trace!("◆ CREATING AGENT {} AT {}", request.name, self.endpoint);
        let agent: Agent = self
            .send(self.client.post(self.url("assistants")).json(&request))
            .await?;
        debug!("◆ AGENT {} CREATED", agent.id);
        Ok(agent)
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        let _: Value = self
            .send(
                self.client
                    .delete(self.url(&format!("assistants/{}", agent_id))),
            )
            .await?;
        Ok(())
    }

    async fn create_thread(&self) -> Result<AgentThread> {
        self.send(self.client.post(self.url("threads")).json(&json!({})))
            .await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<ThreadMessage> {
        let body = json!({ "role": role, "content": content });
        self.send(
            self.client
                .post(self.url(&format!("threads/{}/messages", thread_id)))
                .json(&body),
        )
        .await
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run> {
        let body = json!({ "assistant_id": agent_id });
        self.send(
            self.client
                .post(self.url(&format!("threads/{}/runs", thread_id)))
                .json(&body),
        )
        .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.send(
            self.client
                .get(self.url(&format!("threads/{}/runs/{}", thread_id, run_id))),
        )
        .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run> {
        debug!("◆ SUBMITTING {} TOOL OUTPUTS TO {}", outputs.len(), run_id);
        let body = json!({ "tool_outputs": outputs });
        self.send(
            self.client
                .post(self.url(&format!(
                    "threads/{}/runs/{}/submit_tool_outputs",
                    thread_id, run_id
                )))
                .json(&body),
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let list: MessageList = self
            .send(
                self.client
                    .get(self.url(&format!("threads/{}/messages", thread_id)))
                    .query(&[("order", "desc")]),
            )
            .await?;
        Ok(list.data)
    }
}

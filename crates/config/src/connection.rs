//! Project connection strings
//!
//! A project is addressed as `<host>;<subscription>;<resource-group>;<project>`.

use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub host: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub project_name: String,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let parts: Vec<&str> = raw.trim().split(';').map(str::trim).collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidConnectionString(raw.to_string()));
        }

        let host = parts[0]
            .trim_start_matches("https://")
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host,
            subscription_id: parts[1].to_string(),
            resource_group: parts[2].to_string(),
            project_name: parts[3].to_string(),
        })
    }

    /// Base URL of the project's agents API
    pub fn endpoint(&self) -> String {
        format!(
            "https://{}/agents/v1.0/subscriptions/{}/resourceGroups/{}/providers/Microsoft.MachineLearningServices/workspaces/{}",
            self.host, self.subscription_id, self.resource_group, self.project_name
        )
    }
}

impl FromStr for ConnectionString {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            self.host, self.subscription_id, self.resource_group, self.project_name
        )
    }
}

//! StockPicker command implementations

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use stockpicker_agent::prompt::{analysis_tool_properties_json, DEFAULT_QUERY};
use stockpicker_agent::StockPicker;
use stockpicker_chaos::FaultConfig;
use stockpicker_config::{self, paths, Config};
use stockpicker_provider::AgentsClient;

const REPORT_NAME_CHARS: usize = 40;

/// Initialize config and reports directory
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing StockPicker...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    stockpicker_config::init().await?;

    println!("\n◆ StockPicker initialized");
    println!("\nNext steps:");
    println!(
        "  1. Set project.connection_string and agent.model in {}",
        stockpicker_config::config_path().display()
    );
    println!(
        "     or export {} and {}",
        stockpicker_config::PROJECT_CONNECTION_STRING_VAR,
        stockpicker_config::MODEL_DEPLOYMENT_VAR
    );
    println!("  2. Point search.endpoint at your snippet index");
    println!("  3. Run an analysis: stockpicker analyze -q \"Analyze tech stocks\"");

    Ok(())
}

/// Run one stock analysis
pub async fn analyze_command(
    query: Option<String>,
    history: Option<PathBuf>,
    output: Option<PathBuf>,
    save: bool,
) -> Result<()> {
    let mut config = Config::load().await?;
    config.apply_env();
    config.require_project()?;
    let connection = config.connection()?;

    let chat_history = match &history {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read history file {}", path.display()))?,
        None => String::new(),
    };
    let query = query.unwrap_or_else(|| DEFAULT_QUERY.to_string());

    let client = AgentsClient::new(
        connection.endpoint(),
        config.project.api_key.clone(),
        config.project.api_version.clone(),
    );
    info!("◆ AGENT SERVICE AT {}", client.endpoint());
    if !client.is_configured() {
        warn!(
            "◆ {} NOT SET, sending requests without a bearer token",
            stockpicker_config::AGENTS_API_KEY_VAR
        );
    }

    let picker = StockPicker::from_config(client, &config);
    let report = picker.generate_stock_analysis(&chat_history, &query).await?;

    if save {
        let path = paths::reports_dir().join(report_filename(&query));
        write_report(&path, &report).await?;
        println!("◆ Report saved to {}", path.display());
    }

    match output {
        Some(path) => {
            write_report(&path, &report).await?;
            println!("◆ Report written to {}", path.display());
        }
        None if !save => println!("{}", report),
        None => {}
    }

    Ok(())
}

async fn write_report(path: &Path, report: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        paths::ensure_dir(parent).await?;
    }
    tokio::fs::write(path, report)
        .await
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

/// `<timestamp>-<query prefix>.md`
fn report_filename(query: &str) -> String {
    let stem: String = query
        .trim()
        .chars()
        .take(REPORT_NAME_CHARS)
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    format!(
        "{}-{}.md",
        Local::now().format("%Y%m%d-%H%M%S"),
        paths::safe_filename(&stem)
    )
}

/// Show the chaos settings as read from the environment right now
pub fn chaos_command(json: bool) -> Result<()> {
    let config = FaultConfig::from_env()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("◆ Chaos Settings");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", config);
    if config.enabled {
        println!(
            "Each run fails with probability {:.3}, otherwise waits up to {}s",
            config.error_rate, config.max_delay_seconds
        );
    } else {
        println!("Injection disabled");
    }

    Ok(())
}

/// Print the analysis input schema
pub fn schema_command() -> Result<()> {
    println!("{}", analysis_tool_properties_json()?);
    Ok(())
}

/// Show status
pub async fn status_command() -> Result<()> {
    let config_path = stockpicker_config::config_path();
    let reports = stockpicker_config::reports_dir();

    println!("◆ StockPicker System Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("Config:    {} {}", config_path.display(), present(config_path.exists()));
    println!("Reports:   {} {}", reports.display(), present(reports.exists()));

    let mut config = Config::load().await?;
    config.apply_env();

    let project = match config.connection() {
        Ok(connection) => format!("{} [OK]", connection.project_name),
        Err(e) => format!("[{}]", e),
    };
    println!("Project:   {}", project);
    println!(
        "Model:     {}",
        if config.agent.model.is_empty() {
            "[Missing]"
        } else {
            config.agent.model.as_str()
        }
    );
    println!("API Key:   {}", if config.has_api_key() { "[Set]" } else { "[Not set]" });
    println!(
        "Search:    {}",
        if config.has_search() {
            config.search.endpoint.as_str()
        } else {
            "[Missing]"
        }
    );
    match FaultConfig::from_env() {
        Ok(chaos) if chaos.enabled => println!("Chaos:     [Enabled] {}", chaos),
        Ok(_) => println!("Chaos:     [Disabled]"),
        Err(e) => println!("Chaos:     [{}]", e),
    }

    println!("\n◆ Ready");

    Ok(())
}

fn present(exists: bool) -> &'static str {
    if exists {
        "[OK]"
    } else {
        "[Missing]"
    }
}

use anyhow::Context as _;
use clap::Parser as _;
use secdata_analytics::{AnalyticsGateway, ResponseShaper};
use secdata_mcp::config::{Cli, init_tracing};
use secdata_mcp::{ToolCatalog, ToolDispatcher, stdio};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let settings = cli.settings();
    if settings.api.has_missing_credentials() {
        tracing::warn!(
            "SECDATA_ACCESS_KEY / SECDATA_SECRET_KEY not set; API requests will likely be rejected"
        );
    }

    let gateway = AnalyticsGateway::new(settings.api, ResponseShaper::new(settings.shaping))
        .context("build analytics gateway")?;
    let catalog = ToolCatalog::new(cli.enable_privacy_tools);

    tracing::info!(
        base_url = %gateway.base_url(),
        tools = catalog.enabled().count(),
        privacy_tools = cli.enable_privacy_tools,
        max_results = settings.shaping.max_results,
        max_response_size = settings.shaping.max_response_size,
        truncation = settings.shaping.enable_truncation,
        "secdata-mcp starting on stdio"
    );

    let dispatcher = ToolDispatcher::new(gateway, catalog);
    tokio::select! {
        res = stdio::serve_stdio(&dispatcher) => res.context("serve MCP over stdio")?,
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
    }

    tracing::info!("secdata-mcp stopped");
    Ok(())
}

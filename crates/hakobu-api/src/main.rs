mod api_doc;
mod auth;
mod constants;
mod error;
mod handlers;
mod services;
mod setup;
mod state;

use hakobu_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    setup::telemetry::init_tracing();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize the application (database, services, routes)
    let (_state, router) = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, router).await?;

    Ok(())
}

pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod pages;
pub mod services;
pub mod session;
pub mod shelf;
pub mod state;
pub mod ui;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, UserCommands};
pub use config::Config;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Init)) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("Config file already exists.");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;

    let serving = matches!(cli.command, Some(Commands::Serve));
    let prometheus_handle = if serving && config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;
    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Commands::Serve = command {
        return run_server(config, prometheus_handle).await;
    }

    let state = SharedState::new(config).await?;
    let credentials = &cli.credentials;

    match command {
        Commands::Serve | Commands::Init => Ok(()),

        Commands::Movies {
            category,
            search,
            page,
        } => cli::cmd_movies(&state, category.as_deref(), search, page).await,

        Commands::Movie { id } => cli::cmd_movie(&state, credentials, id).await,

        Commands::Books {
            category,
            search,
            page,
            per_page,
        } => cli::cmd_books(&state, category.as_deref(), search, page, per_page).await,

        Commands::Book { id } => cli::cmd_book(&state, credentials, &id).await,

        Commands::Search { catalog } => cli::cmd_search(&state, catalog).await,

        Commands::List { shelf } => cli::cmd_list(&state, credentials, shelf).await,

        Commands::Add { shelf, id } => cli::cmd_add(&state, credentials, shelf, &id).await,

        Commands::Remove { shelf, id } => cli::cmd_remove(&state, credentials, shelf, &id).await,

        Commands::Progress { id, page } => cli::cmd_progress(&state, credentials, &id, page).await,

        Commands::Review {
            kind,
            id,
            rating,
            comment,
            delete,
        } => cli::cmd_review(&state, credentials, kind, &id, rating, comment, delete).await,

        Commands::Users {
            command: UserCommands::Add { username, password },
        } => cli::cmd_user_add(&state, &username, &password).await,
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder
            .extra_field("version", env!("CARGO_PKG_VERSION"))?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Mediashelf v{} starting API server...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(api_state).await;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 API running at http://0.0.0.0:{}", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

//! # EAS Relay Service
//!
//! Binary entry point for the EAS webhook relay.
//!
//! This executable:
//! - Loads configuration from files and environment variables
//! - Initializes logging
//! - Builds the webhook authenticator and the Slack client
//! - Starts the HTTP server from eas-relay-api

use eas_relay_api::{
    slack::SlackWebhookClient, start_server, AppState, ServiceConfig, ServiceError,
};
use eas_relay_core::signature::WebhookAuthenticator;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "eas_relay_service=info,eas_relay_api=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EAS Relay Service");

    let service_config = match load_configuration() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Could not load service configuration; aborting");
            std::process::exit(3);
        }
    };

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    let authenticator = Arc::new(WebhookAuthenticator::new(
        service_config.relay.webhook_secret.clone(),
    ));
    let notifier = Arc::new(SlackWebhookClient::new(
        service_config.relay.slack_webhook_url.clone(),
        service_config.relay.channel.clone(),
    ));

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        channel = %service_config.relay.channel,
        "Starting HTTP server"
    );

    let state = AppState::new(service_config, authenticator, notifier);

    if let Err(e) = start_server(state).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}

// ============================================================================
// Private helpers
// ============================================================================

/// Load service configuration.
///
/// Sources (applied in order — later sources override earlier ones):
///  1. /etc/eas-relay/service.yaml       — system-wide defaults
///  2. ./config/service.yaml             — deployment-local override
///  3. Path given by EAS_CONFIG_FILE env — operator-specified file
///  4. Environment variables prefixed EAS__ (double-underscore separator)
///     e.g. EAS__SERVER__PORT=9090 sets server.port = 9090
///  5. The canonical SECRET_WEBHOOK_KEY and SLACK_WEBHOOK_URL variables,
///     which map onto relay.webhook_secret and relay.slack_webhook_url
///
/// All fields carry serde defaults, so an empty environment produces a
/// config with built-in defaults — one that then fails `validate()`
/// because the secret and the Slack URL have no usable default. A
/// malformed file or an uncoercible environment value is a hard error.
fn load_configuration() -> anyhow::Result<ServiceConfig> {
    let mut config_builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/eas-relay/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    // Optional explicit path supplied by the operator.
    if let Ok(explicit_path) = std::env::var("EAS_CONFIG_FILE") {
        if !explicit_path.is_empty() {
            config_builder = config_builder.add_source(
                config::File::with_name(&explicit_path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
            info!(path = %explicit_path, "Loading configuration from explicit path");
        }
    }

    config_builder =
        config_builder.add_source(config::Environment::with_prefix("EAS").separator("__"));

    // The canonical variable names from the original deployment take
    // precedence over everything else.
    if let Ok(secret) = std::env::var("SECRET_WEBHOOK_KEY") {
        config_builder = config_builder.set_override("relay.webhook_secret", secret)?;
    }
    if let Ok(url) = std::env::var("SLACK_WEBHOOK_URL") {
        config_builder = config_builder.set_override("relay.slack_webhook_url", url)?;
    }

    let config = config_builder.build()?;
    Ok(config.try_deserialize::<ServiceConfig>()?)
}

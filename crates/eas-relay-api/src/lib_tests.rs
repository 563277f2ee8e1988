//! Tests for configuration validation and error-to-response mapping.

use super::*;

// ============================================================================
// Helpers
// ============================================================================

fn valid_config() -> ServiceConfig {
    ServiceConfig {
        relay: RelayConfig {
            slack_webhook_url: "https://hooks.slack.com/services/T/B/x".to_string(),
            channel: "#releases".to_string(),
            webhook_secret: "shared-secret".to_string(),
        },
        ..ServiceConfig::default()
    }
}

async fn response_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// ServiceConfig validation tests
// ============================================================================

mod config_validation_tests {
    use super::*;

    /// A fully specified configuration passes validation.
    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    /// Server and logging sections carry usable defaults.
    #[test]
    fn test_defaults_for_server_and_logging() {
        let config = ServiceConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
    }

    /// A missing webhook secret is a startup-time failure.
    #[test]
    fn test_missing_secret_rejected() {
        let mut config = valid_config();
        config.relay.webhook_secret = String::new();

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { ref key }) if key.contains("SECRET_WEBHOOK_KEY")));
    }

    /// A missing Slack webhook URL is a startup-time failure.
    #[test]
    fn test_missing_slack_url_rejected() {
        let mut config = valid_config();
        config.relay.slack_webhook_url = String::new();

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { ref key }) if key.contains("SLACK_WEBHOOK_URL")));
    }

    /// A Slack URL that is not HTTP is rejected as invalid.
    #[test]
    fn test_non_http_slack_url_rejected() {
        let mut config = valid_config();
        config.relay.slack_webhook_url = "ftp://example.com/hook".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    /// An empty YAML/environment configuration deserializes to defaults.
    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: ServiceConfig =
            serde_json::from_value(serde_json::json!({ "server": { "port": 9090 } })).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.relay.channel, "#4-productdev_software");
    }

    /// Debug output of the relay section must not leak the secret or the
    /// token-bearing webhook URL.
    #[test]
    fn test_relay_config_debug_redacts_secrets() {
        let config = valid_config();
        let debug_str = format!("{:?}", config.relay);

        assert!(!debug_str.contains("shared-secret"));
        assert!(!debug_str.contains("hooks.slack.com"));
        assert!(debug_str.contains("#releases"));
    }
}

// ============================================================================
// Error response mapping tests
// ============================================================================

mod error_response_tests {
    use super::*;

    /// Signature rejection maps to 500 with the fixed wire-compatible body.
    #[tokio::test]
    async fn test_signature_rejection_maps_to_fixed_500() {
        let response = WebhookHandlerError::SignatureRejected.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response_body(response).await, "Signatures didn't match!");
    }

    /// A malformed payload maps to 400 with a plain-text reason.
    #[tokio::test]
    async fn test_malformed_payload_maps_to_400() {
        let error = WebhookHandlerError::MalformedPayload {
            message: "missing field `projectName`".to_string(),
        };
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_body(response).await;
        assert!(body.starts_with("Invalid payload:"));
        assert!(body.contains("projectName"));
    }
}

// ============================================================================
// Version handler tests
// ============================================================================

mod version_tests {
    use super::*;

    /// `GET /version` reports the fixed API version.
    #[tokio::test]
    async fn test_version_is_static() {
        let Json(response) = handle_version().await;
        assert_eq!(response.version, "1.0.0");
    }
}

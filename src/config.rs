//! Configuration module for the Gemini client

use serde::Deserialize;
use std::env;
use std::fmt;

use crate::error::{GeminiError, Result};

/// Which exchange deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Environment {
    Production,
    Sandbox,
}

impl Environment {
    /// Base URL for REST endpoints.
    pub fn rest_base(&self) -> &'static str {
        match self {
            Environment::Production => "https://api.gemini.com",
            Environment::Sandbox => "https://api.sandbox.gemini.com",
        }
    }

    /// Base URL for streaming endpoints.
    pub fn ws_base(&self) -> &'static str {
        match self {
            Environment::Production => "wss://api.gemini.com",
            Environment::Sandbox => "wss://api.sandbox.gemini.com",
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, Environment::Sandbox)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Sandbox => write!(f, "sandbox"),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Exchange deployment
    pub environment: Environment,

    /// REST endpoint base (overridable for tests)
    pub rest_endpoint: String,

    /// WebSocket endpoint base (overridable for tests)
    pub ws_endpoint: String,

    /// API key for authenticated endpoints
    pub api_key: Option<String>,

    /// API secret for authenticated endpoints
    pub api_secret: Option<String>,
}

impl Config {
    /// Configuration for a given deployment with its default endpoints.
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            rest_endpoint: environment.rest_base().to_string(),
            ws_endpoint: environment.ws_base().to_string(),
            api_key: None,
            api_secret: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Recognized variables: `GEMINI_SANDBOX`, `GEMINI_REST_ENDPOINT`,
    /// `GEMINI_WS_ENDPOINT`, `GEMINI_API_KEY`, `GEMINI_API_SECRET`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let sandbox = env::var("GEMINI_SANDBOX")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let environment = if sandbox {
            Environment::Sandbox
        } else {
            Environment::Production
        };

        let mut config = Self::new(environment);
        if let Ok(endpoint) = env::var("GEMINI_REST_ENDPOINT") {
            config.rest_endpoint = endpoint;
        }
        if let Ok(endpoint) = env::var("GEMINI_WS_ENDPOINT") {
            config.ws_endpoint = endpoint;
        }
        config.api_key = env::var("GEMINI_API_KEY").ok();
        config.api_secret = env::var("GEMINI_API_SECRET").ok();

        Ok(config)
    }

    /// Override the WebSocket endpoint base, e.g. to point at a local server.
    pub fn with_ws_endpoint(mut self, endpoint: &str) -> Self {
        self.ws_endpoint = endpoint.to_string();
        self
    }

    /// Override the REST endpoint base.
    pub fn with_rest_endpoint(mut self, endpoint: &str) -> Self {
        self.rest_endpoint = endpoint.to_string();
        self
    }

    /// The configured credentials, or a config error if either half is missing.
    pub fn credentials(&self) -> Result<(String, String)> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => Ok((key.clone(), secret.clone())),
            _ => Err(GeminiError::Config(
                "GEMINI_API_KEY and GEMINI_API_SECRET are required for authenticated endpoints"
                    .to_string(),
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Environment::Production)
    }
}

//! Error types and handling for the weatherbot crate

use thiserror::Error;

/// Main error type for the weatherbot crate
#[derive(Error, Debug)]
pub enum WeatherBotError {
    /// Report page fetch errors (network, timeout, non-2xx)
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Configuration-related errors (missing API key or source URL)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Forecast API communication errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Input validation errors (malformed location)
    #[error("Invalid input: {message}")]
    Input { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl WeatherBotError {
    /// Create a new report fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new forecast network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new input validation error
    pub fn input<S: Into<String>>(message: S) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get the fixed user-facing message for this error kind.
    ///
    /// The forecast path must never surface a raw error to the chat layer;
    /// every kind maps to exactly one of these strings.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherBotError::Fetch { .. } => "Failed to fetch weather report.".to_string(),
            WeatherBotError::Config { .. } => {
                "Sorry, the forecast service is not configured. Please try again later."
                    .to_string()
            }
            WeatherBotError::Network { .. } => {
                "The weather service is currently unavailable. Please try again later."
                    .to_string()
            }
            WeatherBotError::Input { .. } => {
                "Invalid location provided. Please share a valid location.".to_string()
            }
            WeatherBotError::Io { .. } | WeatherBotError::General { .. } => {
                "An unexpected error occurred while fetching the weather forecast.".to_string()
            }
        }
    }
}

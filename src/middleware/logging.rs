use reqwest::{Method, StatusCode};
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

fn parse_level(log_level: &str) -> Option<Level> {
    match log_level.to_uppercase().as_str() {
        "TRACE" => Some(Level::TRACE),
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARN" | "WARNING" => Some(Level::WARN),
        "ERROR" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize structured logging with the configured level and format
pub fn init_logging(log_level: &str, log_format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level = parse_level(log_level).unwrap_or_else(|| {
        eprintln!("Invalid log level '{}', defaulting to WARN", log_level);
        Level::WARN
    });

    // Configured level wins over RUST_LOG
    let filter_string = format!("taskdesk={},reqwest=warn,hyper=warn", level);
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter_string)?;

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match log_format.to_lowercase().as_str() {
        "json" => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_writer(std::io::stderr);

            subscriber.with(json_layer).try_init()?;
        }
        "plain" | "text" => {
            let plain_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr);

            subscriber.with(plain_layer).try_init()?;
        }
        _ => {
            eprintln!("Invalid log format '{}', defaulting to plain", log_format);
            let plain_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr);

            subscriber.with(plain_layer).try_init()?;
        }
    }

    tracing::debug!(
        log_level = %log_level,
        log_format = %log_format,
        "logging initialized"
    );

    Ok(())
}

/// Timing and correlation data for one outbound request.
pub struct RequestLog {
    pub correlation_id: String,
    method: Method,
    path: String,
    started: Instant,
}

impl RequestLog {
    pub fn start(method: &Method, path: &str) -> Self {
        let correlation_id = Uuid::new_v4().to_string();

        tracing::debug!(
            correlation_id = %correlation_id,
            method = %method,
            path = %path,
            "outgoing request"
        );

        Self {
            correlation_id,
            method: method.clone(),
            path: path.to_string(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn completed(&self, status: StatusCode) {
        let duration = self.elapsed();
        if status.is_success() {
            tracing::debug!(
                correlation_id = %self.correlation_id,
                method = %self.method,
                path = %self.path,
                status = %status,
                duration_ms = duration.as_millis() as u64,
                "request completed"
            );
        } else {
            tracing::warn!(
                correlation_id = %self.correlation_id,
                method = %self.method,
                path = %self.path,
                status = %status,
                duration_ms = duration.as_millis() as u64,
                "request failed"
            );
        }
    }

    pub fn transport_failed(&self, error: &reqwest::Error) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            method = %self.method,
            path = %self.path,
            error = %error,
            duration_ms = self.elapsed().as_millis() as u64,
            "request could not be sent"
        );
    }
}

//! Structured logging support using the `tracing` crate.
//!
//! Library code logs through the `log` facade; installing a [`TracingLogger`]
//! routes those records, together with the structured per-column metric events
//! from [`log_reports`], into a `tracing-subscriber` pipeline.
//!
//! This module is only available when the `structured-logging` feature is enabled:
//!
//! ```toml
//! [dependencies]
//! tensorlogic-eval = { version = "0.1", features = ["structured-logging"] }
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use tensorlogic_eval::structured_logging::{LogFormat, LogLevel, TracingLogger};
//!
//! let logger = TracingLogger::builder()
//!     .with_format(LogFormat::Json)
//!     .with_level(LogLevel::Info)
//!     .build()
//!     .expect("Failed to initialize logger");
//! ```

use crate::{EvalError, EvalResult, RegressionEvaluator};

use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (for development).
    Pretty,
    /// Compact format without colors.
    Compact,
    /// JSON format (for machine parsing and log aggregation).
    Json,
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for structured logging.
#[derive(Debug, Clone)]
pub struct TracingLoggerBuilder {
    format: LogFormat,
    level: LogLevel,
    env_filter: Option<String>,
    with_targets: bool,
}

impl Default for TracingLoggerBuilder {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: LogLevel::Info,
            env_filter: None,
            with_targets: true,
        }
    }
}

impl TracingLoggerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log level filter.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set a custom environment filter (overrides level setting).
    ///
    /// ```
    /// # use tensorlogic_eval::structured_logging::TracingLoggerBuilder;
    /// let builder = TracingLoggerBuilder::new()
    ///     .with_env_filter("tensorlogic_eval=trace");
    /// ```
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Include target names in logs (module paths).
    pub fn with_targets(mut self, enabled: bool) -> Self {
        self.with_targets = enabled;
        self
    }

    /// Build and install the global subscriber.
    ///
    /// Only one subscriber can be installed per process; later calls fail.
    pub fn build(self) -> EvalResult<TracingLogger> {
        let env_filter = if let Some(custom_filter) = self.env_filter {
            EnvFilter::try_new(custom_filter)
                .map_err(|e| EvalError::ConfigError(format!("Invalid env filter: {}", e)))?
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
        };

        let init_err = |e: tracing_subscriber::util::TryInitError| {
            EvalError::Other(format!("Failed to initialize tracing: {}", e))
        };

        match self.format {
            LogFormat::Pretty => {
                let layer = fmt::layer()
                    .with_target(self.with_targets)
                    .pretty();
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer)
                    .try_init()
                    .map_err(init_err)?;
            }
            LogFormat::Compact => {
                let layer = fmt::layer()
                    .with_target(self.with_targets)
                    .with_ansi(false)
                    .compact();
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer)
                    .try_init()
                    .map_err(init_err)?;
            }
            LogFormat::Json => {
                let layer = fmt::layer()
                    .with_target(self.with_targets)
                    .json();
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer)
                    .try_init()
                    .map_err(init_err)?;
            }
        }

        Ok(TracingLogger {
            format: self.format,
        })
    }
}

/// Handle for an installed structured logger.
#[derive(Debug)]
pub struct TracingLogger {
    format: LogFormat,
}

impl TracingLogger {
    /// Create a new logger builder.
    pub fn builder() -> TracingLoggerBuilder {
        TracingLoggerBuilder::new()
    }

    /// Initialize with default settings (pretty format, info level).
    pub fn init() -> EvalResult<Self> {
        Self::builder().build()
    }

    /// Initialize for production (JSON format, info level, no targets).
    pub fn init_production() -> EvalResult<Self> {
        Self::builder()
            .with_format(LogFormat::Json)
            .with_level(LogLevel::Info)
            .with_targets(false)
            .build()
    }

    /// Output format of the installed subscriber.
    pub fn format(&self) -> LogFormat {
        self.format
    }
}

/// Emit one structured `info` event per column with every computable metric.
pub fn log_reports(evaluator: &RegressionEvaluator) -> EvalResult<()> {
    let span = tracing::info_span!("regression_eval", columns = evaluator.num_columns());
    let _guard = span.enter();
    for report in evaluator.reports()? {
        tracing::info!(
            column = report.column,
            name = %report.name,
            count = report.count,
            mse = ?report.mean_squared_error,
            mae = ?report.mean_absolute_error,
            rmse = ?report.root_mean_squared_error,
            rse = ?report.relative_squared_error,
            r2 = ?report.r_squared,
            pearson = ?report.pearson_correlation,
            correlation_r2 = ?report.correlation_r2,
            "Column metrics"
        );
    }
    Ok(())
}

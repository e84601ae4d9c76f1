// ABOUTME: Tracing subscriber setup for applications embedding the engine
// ABOUTME: Reads LIFTLOG_LOG_* variables and installs a filtered fmt layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! Structured logging configuration
//!
//! The engine only emits `tracing` events; embedding applications decide
//! whether to install this subscriber or their own. Integration tests
//! install it with [`LogWriter::Test`].

use anyhow::{anyhow, Result};
use std::env;
use std::io;
use tracing::{info, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Format},
        writer::BoxMakeWriter,
        TestWriter,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Crates whose events are capped below the engine level
const QUIET_TARGETS: [&str; 2] = ["sqlx=warn", "rayon=warn"];

/// Environment variables read by [`LoggingConfig::from_env`]
pub mod vars {
    /// Output format: `json`, `compact`, or anything else for pretty
    pub const FORMAT: &str = "LIFTLOG_LOG_FORMAT";
    /// Deployment environment; `production` turns on location and thread ids
    pub const ENVIRONMENT: &str = "LIFTLOG_ENVIRONMENT";
    /// Present to log source file and line
    pub const LOCATION: &str = "LIFTLOG_LOG_LOCATION";
    /// Present to log thread ids and names
    pub const THREAD: &str = "LIFTLOG_LOG_THREAD";
    /// Present to log span open and close events
    pub const SPANS: &str = "LIFTLOG_LOG_SPANS";
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line human readable output
    Pretty,
    /// Single-line output without targets
    Compact,
}

/// Where formatted events go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogWriter {
    /// Process standard output
    Stdout,
    /// libtest's captured output, shown only for failing tests
    Test,
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level for the engine's own targets, and the fallback when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Output destination
    pub writer: LogWriter,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread ids and names
    pub include_thread: bool,
    /// Include span open/close events
    pub include_spans: bool,
    /// Deployment environment reported at startup
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            writer: LogWriter::Stdout,
            include_location: false,
            include_thread: false,
            include_spans: false,
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Read the configuration from `RUST_LOG` and the [`vars`] variables
    #[must_use]
    pub fn from_env() -> Self {
        let format = match env::var(vars::FORMAT).as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        let environment = env::var(vars::ENVIRONMENT).unwrap_or_else(|_| "development".into());
        let production = environment == "production";

        Self {
            level: env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
            format,
            writer: LogWriter::Stdout,
            include_location: production || env::var(vars::LOCATION).is_ok(),
            include_thread: production || env::var(vars::THREAD).is_ok(),
            include_spans: env::var(vars::SPANS).is_ok(),
            environment,
        }
    }

    /// Compact output captured by the test harness
    #[must_use]
    pub fn for_tests(level: &str) -> Self {
        Self {
            level: level.to_owned(),
            format: LogFormat::Compact,
            writer: LogWriter::Test,
            environment: "test".into(),
            ..Self::default()
        }
    }

    /// `RUST_LOG` (or the configured level) plus the engine and quiet-target directives
    pub(crate) fn env_filter(&self) -> EnvFilter {
        let base = env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone());
        let mut filter = EnvFilter::new(base);
        for directive in QUIET_TARGETS {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
        match format!("liftlog={}", self.level).parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    }

    pub(crate) fn span_events(&self) -> FmtSpan {
        if self.include_spans && self.format != LogFormat::Compact {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn make_writer(&self) -> BoxMakeWriter {
        match self.writer {
            LogWriter::Stdout => BoxMakeWriter::new(io::stdout),
            LogWriter::Test => BoxMakeWriter::new(TestWriter::new()),
        }
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    {
        let layer = fmt::layer()
            .with_writer(self.make_writer())
            .with_span_events(self.span_events());
        match self.format {
            LogFormat::Compact => layer.compact().with_target(false).boxed(),
            LogFormat::Pretty => self.decorate(layer).boxed(),
            LogFormat::Json => self.decorate(layer).json().boxed(),
        }
    }

    fn decorate<S, N, L, T, W>(
        &self,
        layer: fmt::Layer<S, N, Format<L, T>, W>,
    ) -> fmt::Layer<S, N, Format<L, T>, W>
    where
        N: for<'w> fmt::FormatFields<'w> + 'static,
    {
        layer
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_thread_ids(self.include_thread)
            .with_thread_names(self.include_thread)
            .with_target(true)
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(self.fmt_layer())
            .try_init()
            .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            level = %self.level,
            format = ?self.format,
            location = self.include_location,
            thread = self.include_thread,
            spans = self.include_spans,
            "liftlog logging initialized"
        );
        Ok(())
    }
}

/// Install the subscriber described by the environment
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

//! Telemetry primitives shared across the QuickFix admin workspace.
//!
//! This crate centralises logging setup and the Prometheus registry so the
//! console and any embedding surface report list activity the same way.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;
use tracing::{Span, span::Entered};
use tracing_subscriber::{EnvFilter, fmt};

/// Default logging target when `RUST_LOG` is not provided.
const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the tracing subscriber cannot be installed (for example,
/// because another subscriber has already been set globally).
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    BUILD_SHA
        .set(config.build_sha.to_string())
        .ok()
        .or(Some(()));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level));

    let install = |format: LogFormat| {
        let builder = fmt::fmt()
            .with_env_filter(env_filter.clone())
            .with_target(false)
            .with_thread_ids(false);

        match format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
        }
    };

    install(config.format).map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;

    Ok(())
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    pub level: &'a str,
    pub format: LogFormat,
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: build_sha(),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    #[must_use]
    pub fn new(surface: impl Into<String>) -> Self {
        let surface = surface.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", surface = %surface, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Prometheus-backed metrics registry shared across list screens.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    api_requests_total: IntCounterVec,
    fetches_total: IntCounterVec,
    mutations_total: IntCounterVec,
    searches_total: IntCounterVec,
    page_corrections_total: IntCounterVec,
    active_screens: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub active_screens: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let api_requests_total = IntCounterVec::new(
            Opts::new("api_requests_total", "API requests issued by the console"),
            &["collection", "method", "outcome"],
        )?;
        let fetches_total = IntCounterVec::new(
            Opts::new("list_fetches_total", "List fetches by screen and outcome"),
            &["screen", "outcome"],
        )?;
        let mutations_total = IntCounterVec::new(
            Opts::new(
                "list_mutations_total",
                "List mutations by screen, kind, and outcome",
            ),
            &["screen", "kind", "outcome"],
        )?;
        let searches_total = IntCounterVec::new(
            Opts::new(
                "list_searches_total",
                "Search keystrokes by screen and whether the debounce committed",
            ),
            &["screen", "outcome"],
        )?;
        let page_corrections_total = IntCounterVec::new(
            Opts::new(
                "list_page_corrections_total",
                "Automatic page corrections after a page emptied out",
            ),
            &["screen"],
        )?;
        let active_screens =
            IntGauge::with_opts(Opts::new("active_screens", "Live list controllers"))?;

        registry.register(Box::new(api_requests_total.clone()))?;
        registry.register(Box::new(fetches_total.clone()))?;
        registry.register(Box::new(mutations_total.clone()))?;
        registry.register(Box::new(searches_total.clone()))?;
        registry.register(Box::new(page_corrections_total.clone()))?;
        registry.register(Box::new(active_screens.clone()))?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                api_requests_total,
                fetches_total,
                mutations_total,
                searches_total,
                page_corrections_total,
                active_screens,
            }),
        })
    }

    /// Increment the API request counter for one issued request.
    pub fn inc_api_request(&self, collection: &str, method: &str, outcome: &str) {
        self.inner
            .api_requests_total
            .with_label_values(&[collection, method, outcome])
            .inc();
    }

    /// Increment the fetch counter for the given screen and outcome.
    pub fn inc_fetch(&self, screen: &str, outcome: &str) {
        self.inner
            .fetches_total
            .with_label_values(&[screen, outcome])
            .inc();
    }

    /// Increment the mutation counter for the given screen, kind, and outcome.
    pub fn inc_mutation(&self, screen: &str, kind: &str, outcome: &str) {
        self.inner
            .mutations_total
            .with_label_values(&[screen, kind, outcome])
            .inc();
    }

    /// Increment the search counter for the given screen and outcome.
    pub fn inc_search(&self, screen: &str, outcome: &str) {
        self.inner
            .searches_total
            .with_label_values(&[screen, outcome])
            .inc();
    }

    /// Increment the page correction counter for the given screen.
    pub fn inc_page_correction(&self, screen: &str) {
        self.inner
            .page_corrections_total
            .with_label_values(&[screen])
            .inc();
    }

    /// Record a list controller coming up.
    pub fn inc_active_screens(&self) {
        self.inner.active_screens.inc();
    }

    /// Record a list controller shutting down.
    pub fn dec_active_screens(&self) {
        self.inner.active_screens.dec();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("failed to encode Prometheus metrics")?;
        String::from_utf8(buffer).context("metrics output was not valid UTF-8")
    }

    /// Take a point-in-time snapshot of the most relevant gauges.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_screens: self.inner.active_screens.get(),
        }
    }
}

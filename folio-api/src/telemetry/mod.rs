//! Folio Telemetry - Logging and Metrics
//!
//! Structured logging through tracing-subscriber and Prometheus metrics for
//! the HTTP layer and the article cache.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, record_cache_read, FolioMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::{init_tracer, LogFormat, TelemetryConfig};

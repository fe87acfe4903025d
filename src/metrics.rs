//! Query metrics and tracing helpers.
//!
//! Metrics are recorded through the global OpenTelemetry meter. Call
//! [`install_prometheus`] once at startup, before the first query, so the
//! instruments in [`METRICS`] bind to a real provider.

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
    KeyValue,
};

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<DaoMetrics> = Lazy::new(DaoMetrics::init);

#[cfg(feature = "metrics")]
pub struct DaoMetrics {
    pub queries_total: Counter<u64>,
    pub query_errors_total: Counter<u64>,
    pub query_duration: Histogram<f64>,
    pub operations_total: Counter<u64>,
    pub batch_chunks_total: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl DaoMetrics {
    pub fn init() -> Self {
        let meter = global::meter("daoguard");

        let queries_total = meter
            .u64_counter("daoguard_queries_total")
            .with_description("Total statements sent to the driver")
            .build();

        let query_errors_total = meter
            .u64_counter("daoguard_query_errors_total")
            .with_description("Statements the driver rejected")
            .build();

        let query_duration = meter
            .f64_histogram("daoguard_query_duration_seconds")
            .with_description("Driver round-trip duration")
            .build();

        let operations_total = meter
            .u64_counter("daoguard_operations_total")
            .with_description("DAO operations by kind")
            .build();

        let batch_chunks_total = meter
            .u64_counter("daoguard_batch_chunks_total")
            .with_description("Insert statements issued by batch inserts")
            .build();

        Self {
            queries_total,
            query_errors_total,
            query_duration,
            operations_total,
            batch_chunks_total,
        }
    }

    pub fn record_query_duration(&self, elapsed: std::time::Duration) {
        self.queries_total.add(1, &[]);
        self.query_duration.record(elapsed.as_secs_f64(), &[]);
    }

    pub fn record_query_error(&self) {
        self.query_errors_total.add(1, &[]);
    }

    pub fn record_operation(&self, operation: &'static str, table: &'static str) {
        self.operations_total.add(
            1,
            &[
                KeyValue::new("operation", operation),
                KeyValue::new("table", table),
            ],
        );
    }

    pub fn record_batch_chunk(&self, table: &'static str) {
        self.batch_chunks_total
            .add(1, &[KeyValue::new("table", table)]);
    }
}

/// Route the global meter into a Prometheus registry
///
/// # Errors
///
/// Returns `DaoError::Config` if the exporter cannot be built.
#[cfg(feature = "metrics")]
pub fn install_prometheus(
    registry: &prometheus::Registry,
) -> Result<(), crate::executor::DaoError> {
    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()
        .map_err(|e| {
            crate::executor::DaoError::Config(format!("failed to build prometheus exporter: {e}"))
        })?;
    let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
        .with_reader(exporter)
        .build();
    global::set_meter_provider(provider);
    Ok(())
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    /// Span around a single driver call
    pub fn execute_query_span(sql: &str) -> Span {
        info_span!("daoguard.query", db.statement = sql)
    }

    /// Span around a DAO operation, tagged with the caller's context label
    pub fn operation_span(operation: &'static str, table: &'static str, label: Option<&str>) -> Span {
        info_span!(
            "daoguard.operation",
            operation,
            db.table = table,
            context = label.unwrap_or("")
        )
    }
}

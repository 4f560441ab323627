// Metrics publishing module

/// Fire-and-forget sink for named numeric observations, dimensioned by
/// symbol. Publishing is best-effort: an implementation must never
/// block the pipeline or surface a failure to the caller.
pub trait MetricsSink: Send + Sync {
    fn publish(&self, name: &str, value: f64, symbol: Option<&str>);
}

/// Sink that emits metrics as structured log events under the
/// `metrics` target, for scraping by the log pipeline.
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn publish(&self, name: &str, value: f64, symbol: Option<&str>) {
        tracing::info!(
            target: "metrics",
            metric = name,
            value,
            symbol = symbol.unwrap_or("-"),
        );
    }
}

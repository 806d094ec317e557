use crate::config::{LogFormat, TelemetryConfig};
use metrics::{describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const PAGES_FETCHED: &str = "tenders_pages_fetched";
pub const NOTICES_ACCEPTED: &str = "tenders_accepted";
pub const NOTICES_DUPLICATE: &str = "tenders_duplicates";
pub const NOTICES_MALFORMED: &str = "tenders_malformed";
pub const TENDERS_INSERTED: &str = "tenders_inserted";
pub const BATCH_FAILURES: &str = "tenders_batch_failures";

pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    // A one-shot run only needs the exporter when something scrapes it while it works
    if config.metrics_enabled {
        let addr: SocketAddr = ([0, 0, 0, 0], config.metrics_port).into();
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;

        tracing::info!(
            port = config.metrics_port,
            "Metrics endpoint started at http://0.0.0.0:{}/metrics",
            config.metrics_port
        );
    }

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(PAGES_FETCHED, Unit::Count, "Upstream notice pages fetched");
    describe_counter!(NOTICES_ACCEPTED, Unit::Count, "Notices accepted for insertion");
    describe_counter!(NOTICES_DUPLICATE, Unit::Count, "Notices skipped as already known");
    describe_counter!(NOTICES_MALFORMED, Unit::Count, "Notices skipped as malformed");
    describe_counter!(TENDERS_INSERTED, Unit::Count, "Tender records written to the store");
    describe_counter!(BATCH_FAILURES, Unit::Count, "Batch inserts rejected by the store");
}

pub fn shutdown() {
    tracing::info!("Shutting down telemetry");
}

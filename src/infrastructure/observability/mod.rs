//! Log subscriber, optional OTLP trace export and the Prometheus endpoint
//! that serves `oauth_flow_total`.

use crate::config::Config;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const DEFAULT_LOG_FILTER: &str = "gatehouse=debug,tower_http=debug,axum=info";

/// Flushes pending spans when dropped. Hold it for the life of `main`.
pub struct ObservabilityGuard {
    otlp_enabled: bool,
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        if self.otlp_enabled {
            global::shutdown_tracer_provider();
        }
    }
}

pub fn init(config: &Config) -> Result<ObservabilityGuard, Box<dyn std::error::Error>> {
    let otlp_enabled = init_tracing(config)?;
    init_metrics(config)?;
    Ok(ObservabilityGuard { otlp_enabled })
}

fn init_tracing(config: &Config) -> Result<bool, Box<dyn std::error::Error>> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let Some(endpoint) = &config.otel_exporter_endpoint else {
        Registry::default().with(env_filter).with(fmt_layer).try_init()?;
        return Ok(false);
    };

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", config.service_name.clone()),
        ])))
        .install_batch(runtime::Tokio)?;

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()?;

    tracing::info!(endpoint = %endpoint, "OTLP trace export enabled");
    Ok(true)
}

fn init_metrics(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if config.metrics_port == 0 {
        tracing::info!("Metrics exporter disabled");
        return Ok(());
    }

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .install()?;

    tracing::info!(port = config.metrics_port, "Prometheus metrics exporter started");
    Ok(())
}

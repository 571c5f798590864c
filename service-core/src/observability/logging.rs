use crate::error::AppError;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: env filter plus flattened JSON events.
///
/// When `otlp_endpoint` is set, spans are additionally exported over OTLP/gRPC.
/// `RUST_LOG` overrides `log_level` when present.
pub fn init_tracing(
    service_name: &str,
    log_level: &str,
    otlp_endpoint: Option<&str>,
) -> Result<(), AppError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .json()
        .flatten_event(true);

    let telemetry = match otlp_endpoint {
        Some(endpoint) => {
            let otlp_exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint);

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(otlp_exporter)
                .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", service_name.to_string()),
                ])))
                .install_batch(runtime::Tokio)
                .map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "Failed to initialize OTLP tracer for '{}' at '{}': {}",
                        service_name,
                        endpoint,
                        e
                    ))
                })?;

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Failed to install subscriber: {}", e)))
}

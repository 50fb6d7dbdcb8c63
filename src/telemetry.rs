use opentelemetry::{
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::collections::HashSet;

pub struct Metrics {
    prediction_counter: Counter<u64>,
    error_counter: Counter<u64>,
    prediction_duration: Histogram<u64>,
    pub registry: Registry,
    // keeps the exporter reader alive for the registry
    _provider: SdkMeterProvider,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to build prometheus exporter: {0}")]
pub struct MetricsError(String);

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
            .map_err(|e| MetricsError(e.to_string()))?;

        let provider = SdkMeterProvider::builder().with_reader(exporter).build();
        let meter = provider.meter("face_emotion");

        let prediction_counter = meter
            .u64_counter("predictions_total")
            .with_description("Total number of successful predictions by emotion")
            .build();

        let error_counter = meter
            .u64_counter("prediction_errors_total")
            .with_description("Total number of prediction requests rendered as errors")
            .build();

        let boundaries = generate_boundaries((5, 25, 50, 250, 1000));

        let prediction_duration = meter
            .u64_histogram("prediction_duration_ms")
            .with_boundaries(boundaries)
            .with_description("Duration of prediction requests in milliseconds")
            .build();

        Ok(Metrics {
            prediction_counter,
            error_counter,
            prediction_duration,
            registry,
            _provider: provider,
        })
    }

    pub fn record_prediction(&self, emotion: &str) {
        let attributes = vec![KeyValue::new("emotion", emotion.to_string())];
        self.prediction_counter.add(1, &attributes);
    }

    pub fn record_error(&self, kind: &'static str) {
        let attributes = vec![KeyValue::new("kind", kind)];
        self.error_counter.add(1, &attributes);
    }

    pub fn record_prediction_duration(&self, duration_ms: u64) {
        self.prediction_duration.record(duration_ms, &[]);
    }
}

fn generate_boundaries(parts: (i32, i32, i32, i32, i32)) -> Vec<f64> {
    let first_step: usize = 5;
    let middle_step: usize = 5;
    let end_step: usize = 50;
    let tail_step: usize = 250;
    let first_part = (parts.0..=parts.1).step_by(first_step);
    let middle_part = (parts.1..=parts.2).step_by(middle_step);
    let end_part = (parts.2..=parts.3).step_by(end_step);
    let tail_part = (parts.3..=parts.4).step_by(tail_step);

    let mut seen = HashSet::new();
    first_part
        .chain(middle_part)
        .chain(end_part)
        .chain(tail_part)
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_boundaries() {
        let get = generate_boundaries((5, 25, 50, 250, 1000));
        let expected = vec![
            5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 100.0, 150.0, 200.0, 250.0,
            500.0, 750.0, 1000.0,
        ];

        assert_eq!(get, expected);
    }

    #[test]
    fn test_recorded_predictions_are_exported() {
        let metrics = Metrics::new().unwrap();
        metrics.record_prediction("Happy");
        metrics.record_prediction_duration(12);

        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();

        assert!(names.iter().any(|name| name.starts_with("predictions_total")));
        assert!(names
            .iter()
            .any(|name| name.starts_with("prediction_duration_ms")));
    }
}

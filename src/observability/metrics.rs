//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_methods_invocations_total` (counter): calls by method, verb, outcome
//! - `server_methods_invocation_duration_seconds` (histogram): call latency
//!
//! # Design Decisions
//! - Recorded from an after-hook, so aborted calls are counted too
//! - Exporter is optional; without it the macros are no-ops

use std::net::SocketAddr;

use metrics::Label;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::pipeline::AfterContext;

pub const INVOCATIONS_TOTAL: &str = "server_methods_invocations_total";
pub const INVOCATION_DURATION: &str = "server_methods_invocation_duration_seconds";

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Outcome label for a settled call.
pub fn outcome(ctx: &AfterContext) -> &'static str {
    use crate::error::InvocationError;

    match &ctx.error {
        None => "ok",
        Some(InvocationError::Aborted(_)) => "aborted",
        Some(InvocationError::Handler(_)) => "error",
    }
}

/// After-hook: count and time the call.
pub fn record_invocation(ctx: &AfterContext) {
    let labels = vec![
        Label::new("method", ctx.name.clone()),
        Label::new("verb", ctx.verb.as_str()),
    ];
    metrics::histogram!(INVOCATION_DURATION, labels.clone()).record(ctx.elapsed.as_secs_f64());

    let mut labels = labels;
    labels.push(Label::new("outcome", outcome(ctx)));
    metrics::counter!(INVOCATIONS_TOTAL, labels).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InvocationError, ServerMethodError};
    use crate::methods::{sync_handler, HandlerSpec, MethodDescriptor, Verb};
    use crate::pipeline::InvocationContext;
    use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn settled(outcome: Result<Value, InvocationError>) -> AfterContext {
        let spec = HandlerSpec::new(sync_handler(|_| Ok(Value::Null)));
        let descriptor = MethodDescriptor::new("foo", Verb::Put, "/foo", &spec, None).unwrap();
        AfterContext::settle(InvocationContext::new(&descriptor, vec![], "/foo".into()), &outcome)
    }

    fn failure(status: u16) -> ServerMethodError {
        ServerMethodError::new(status, "foo", vec![], "failed")
    }

    /// Remembers every registered key as `name{k=v,...}`.
    #[derive(Default)]
    struct KeyLog(Mutex<Vec<String>>);

    impl KeyLog {
        fn push(&self, key: &Key) {
            let labels: Vec<String> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
            self.0.lock().unwrap().push(format!("{}{{{}}}", key.name(), labels.join(",")));
        }
    }

    impl Recorder for KeyLog {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            self.push(key);
            Counter::noop()
        }

        fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
            self.push(key);
            Gauge::noop()
        }

        fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
            self.push(key);
            Histogram::noop()
        }
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome(&settled(Ok(json!(1)))), "ok");
        assert_eq!(outcome(&settled(Err(InvocationError::Aborted(failure(403))))), "aborted");
        assert_eq!(outcome(&settled(Err(InvocationError::Handler(failure(500))))), "error");
    }

    #[test]
    fn test_record_invocation_keys() {
        let recorder = KeyLog::default();
        metrics::with_local_recorder(&recorder, || {
            record_invocation(&settled(Ok(json!(1))));
            record_invocation(&settled(Err(InvocationError::Aborted(failure(401)))));
        });

        let keys = recorder.0.lock().unwrap().clone();
        assert_eq!(
            keys,
            vec![
                format!("{}{{method=foo,verb=PUT}}", INVOCATION_DURATION),
                format!("{}{{method=foo,verb=PUT,outcome=ok}}", INVOCATIONS_TOTAL),
                format!("{}{{method=foo,verb=PUT}}", INVOCATION_DURATION),
                format!("{}{{method=foo,verb=PUT,outcome=aborted}}", INVOCATIONS_TOTAL),
            ]
        );
    }
}

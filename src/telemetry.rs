//! Operational telemetry for the local mirror.
//!
//! git-insight is a local-first tool; the only signal it captures is the
//! active database schema version, surfaced through the same tracing
//! subscriber as the rest of the crate's diagnostics.

/// A structured telemetry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// Records the database schema version after migrations apply.
    SchemaVersionRecorded {
        /// Diesel migration version string (e.g. `20260829000000`).
        schema_version: String,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Emits telemetry events through the active tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::SchemaVersionRecorded { schema_version } => {
                tracing::info!(schema_version, "database schema version recorded");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{TelemetryEvent, TelemetrySink};

    /// Sink that stores events for later inspection in tests.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: std::sync::Mutex<Vec<TelemetryEvent>>,
    }

    impl RecordingSink {
        pub fn take(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .expect("events mutex should be available")
                .drain(..)
                .collect()
        }
    }

    impl TelemetrySink for RecordingSink {
        fn record(&self, event: TelemetryEvent) {
            self.events
                .lock()
                .expect("events mutex should be available")
                .push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingSink;
    use super::{TelemetryEvent, TelemetrySink};

    #[test]
    fn recording_sink_captures_events() {
        let sink = RecordingSink::default();
        sink.record(TelemetryEvent::SchemaVersionRecorded {
            schema_version: "20260829000000".to_owned(),
        });

        assert_eq!(
            sink.take(),
            vec![TelemetryEvent::SchemaVersionRecorded {
                schema_version: "20260829000000".to_owned(),
            }]
        );
    }
}

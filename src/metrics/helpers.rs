//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    EVENTS_DELIVERED_TOTAL, EVENTS_EMITTED_TOTAL, EVENTS_FAILED_TOTAL, HEARTBEAT_DURATION_MS,
    HEARTBEAT_TIMEOUTS, WS_MESSAGES_RECEIVED,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording emit metrics
pub struct EmitMetrics;

impl EmitMetrics {
    /// Record an event emitted to a user
    pub fn record_user_emit() {
        EVENTS_EMITTED_TOTAL.with_label_values(&["user"]).inc();
    }

    /// Record an event emitted to a single socket
    pub fn record_socket_emit() {
        EVENTS_EMITTED_TOTAL.with_label_values(&["socket"]).inc();
    }

    /// Record successful deliveries
    pub fn record_delivered(count: u64) {
        EVENTS_DELIVERED_TOTAL.inc_by(count);
    }

    /// Record failed deliveries
    pub fn record_failed(count: u64) {
        EVENTS_FAILED_TOTAL.inc_by(count);
    }
}

/// Helper struct for recording WebSocket message metrics
pub struct WsMessageMetrics;

impl WsMessageMetrics {
    /// Record a ping message
    pub fn record_ping() {
        WS_MESSAGES_RECEIVED.with_label_values(&["ping"]).inc();
    }

    /// Record an unparseable message
    pub fn record_invalid() {
        WS_MESSAGES_RECEIVED.with_label_values(&["invalid"]).inc();
    }
}

/// Helper struct for heartbeat metrics
pub struct HeartbeatMetrics;

impl HeartbeatMetrics {
    /// Record heartbeat round duration
    pub fn record_duration_ms(duration_ms: u64) {
        HEARTBEAT_DURATION_MS.observe(duration_ms as f64);
    }

    /// Record heartbeat timeouts
    pub fn record_timeouts(count: u64) {
        HEARTBEAT_TIMEOUTS.inc_by(count);
    }
}

//! Prometheus metrics for torhaus-server.
//!
//! Exposes server metrics in Prometheus format at the `/metrics` endpoint.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Initialize the Prometheus metrics recorder and return a handle for
/// rendering. Idempotent so tests can build many app states in one process.
pub fn init_metrics() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            describe_counter!(
                "torhaus_invites_issued_total",
                "Total number of invite links issued"
            );
            describe_counter!(
                "torhaus_invite_validations_total",
                "Token validation checks by outcome"
            );
            describe_counter!(
                "torhaus_invite_consumptions_total",
                "Invite consumption attempts by outcome"
            );
            describe_counter!(
                "torhaus_reservations_created_total",
                "Reservation requests accepted"
            );
            describe_counter!(
                "torhaus_invite_emails_total",
                "Invite email deliveries by status"
            );

            handle
        })
        .clone()
}

pub fn record_invite_issued() {
    counter!("torhaus_invites_issued_total").increment(1);
}

pub fn record_validation(outcome: &'static str) {
    counter!("torhaus_invite_validations_total", "outcome" => outcome).increment(1);
}

pub fn record_consumption(outcome: &'static str) {
    counter!("torhaus_invite_consumptions_total", "outcome" => outcome).increment(1);
}

pub fn record_reservation_created() {
    counter!("torhaus_reservations_created_total").increment(1);
}

pub fn record_invite_email(status: &'static str) {
    counter!("torhaus_invite_emails_total", "status" => status).increment(1);
}

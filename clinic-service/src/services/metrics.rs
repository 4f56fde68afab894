//! Prometheus exposition for clinic-service.
//!
//! HTTP request metrics come from the shared middleware; the counters below
//! track clinic activity.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), AppError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("failed to install Prometheus recorder: {}", e))
    })?;

    let _ = METRICS_HANDLE.set(handle);

    metrics::describe_counter!(
        "clinic_patients_registered_total",
        "Patients registered through the intake form"
    );
    metrics::describe_counter!(
        "clinic_prescriptions_appended_total",
        "Prescription lines appended, by target list"
    );
    metrics::describe_counter!(
        "clinic_patients_completed_total",
        "Consultations marked as completed"
    );
    metrics::describe_counter!("clinic_reviews_submitted_total", "Reviews submitted");
    metrics::describe_counter!(
        "clinic_admin_logins_total",
        "Admin login attempts, by outcome"
    );

    Ok(())
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_patient_registered() {
    metrics::counter!("clinic_patients_registered_total").increment(1);
}

/// `field` is `prescription` or `newPrescription`.
pub fn record_prescriptions_appended(field: &'static str, count: usize) {
    if count > 0 {
        metrics::counter!("clinic_prescriptions_appended_total", "field" => field)
            .increment(count as u64);
    }
}

pub fn record_patient_completed() {
    metrics::counter!("clinic_patients_completed_total").increment(1);
}

pub fn record_review_submitted() {
    metrics::counter!("clinic_reviews_submitted_total").increment(1);
}

pub fn record_admin_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("clinic_admin_logins_total", "outcome" => outcome).increment(1);
}

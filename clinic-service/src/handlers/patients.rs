use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mongodb::bson::oid::ObjectId;
use service_core::{error::AppError, extract::ValidatedJson};

use crate::{
    dtos::patients::{
        AppendPrescriptionsRequest, CreatePatientRequest, PatientEnvelope, PatientResponse,
    },
    models::{parse_record_id, Patient},
    services::metrics,
    AppState,
};

const USER_NOT_FOUND: &str = "User not found";

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!(USER_NOT_FOUND))
}

/// Malformed ids cannot name a stored record, so they share the 404 path.
fn record_id(raw: &str) -> Result<ObjectId, AppError> {
    parse_record_id(raw).ok_or_else(not_found)
}

fn found(patient: Option<Patient>) -> Result<Patient, AppError> {
    patient.ok_or_else(not_found)
}

/// List every patient record
#[utoipa::path(
    get,
    path = "/api/userDetails",
    responses(
        (status = 200, description = "All patients, oldest first", body = [PatientResponse]),
        (status = 401, description = "Admin session required", body = MessageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Patients",
    security((), ("admin_session" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientResponse>>, AppError> {
    let patients = state.patients.list().await?;
    Ok(Json(patients.into_iter().map(Into::into).collect()))
}

/// Fetch one patient record
#[utoipa::path(
    get,
    path = "/api/userDetails/{id}",
    params(("id" = String, Path, description = "Patient ObjectId")),
    responses(
        (status = 200, description = "Patient found", body = PatientResponse),
        (status = 404, description = "User not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Patients",
    security((), ("admin_session" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientResponse>, AppError> {
    let id = record_id(&id)?;
    let patient = found(state.patients.get(&id).await?)?;
    Ok(Json(patient.into()))
}

/// Register a patient from the intake form
#[utoipa::path(
    post,
    path = "/api/userDetails",
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "User created successfully", body = PatientEnvelope),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Patients"
)]
#[tracing::instrument(skip(state, req))]
pub async fn create_patient(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreatePatientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let patient = state
        .patients
        .create(Patient::new(req.into_new_patient()))
        .await?;

    metrics::record_patient_registered();
    tracing::info!(patient_id = %patient.id, "Patient registered");

    Ok((
        StatusCode::CREATED,
        Json(PatientEnvelope::new("User created successfully", patient)),
    ))
}

/// Append prescription lines to a patient record
#[utoipa::path(
    put,
    path = "/api/userDetails/{id}",
    params(("id" = String, Path, description = "Patient ObjectId")),
    request_body = AppendPrescriptionsRequest,
    responses(
        (status = 200, description = "User updated successfully", body = PatientEnvelope),
        (status = 400, description = "Validation error"),
        (status = 404, description = "User not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Patients",
    security((), ("admin_session" = []))
)]
#[tracing::instrument(skip(state, req))]
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<AppendPrescriptionsRequest>,
) -> Result<Json<PatientEnvelope>, AppError> {
    let id = record_id(&id)?;
    let (prescription, new_prescription) = req.into_prescriptions();
    let (prior, added) = (prescription.len(), new_prescription.len());

    let patient = found(
        state
            .patients
            .append_prescriptions(&id, prescription, new_prescription)
            .await?,
    )?;

    metrics::record_prescriptions_appended("prescription", prior);
    metrics::record_prescriptions_appended("newPrescription", added);
    tracing::info!(patient_id = %id, prior, added, "Prescriptions appended");

    Ok(Json(PatientEnvelope::new("User updated successfully", patient)))
}

/// Mark a consultation as completed
#[utoipa::path(
    put,
    path = "/api/userDetail/{id}/complete",
    params(("id" = String, Path, description = "Patient ObjectId")),
    responses(
        (status = 200, description = "User marked as completed", body = PatientEnvelope),
        (status = 404, description = "User not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Patients",
    security((), ("admin_session" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn complete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientEnvelope>, AppError> {
    let id = record_id(&id)?;
    let patient = found(state.patients.mark_completed(&id).await?)?;

    metrics::record_patient_completed();
    tracing::info!(patient_id = %id, "Patient marked as completed");

    Ok(Json(PatientEnvelope::new("User marked as completed", patient)))
}

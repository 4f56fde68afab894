use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::validate_not_blank;
use crate::models::{NewPatient, NewPrescription, Patient, Prescription, Sex};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePatientRequest {
    #[validate(
        required(message = "Name is required"),
        custom(function = "validate_not_blank"),
        length(max = 100, message = "Name must be at most 100 characters")
    )]
    #[schema(example = "Asha Rao")]
    pub name: Option<String>,

    /// Accepts a JSON number or a numeric string, as sent by HTML forms.
    #[serde(default, deserialize_with = "deserialize_age")]
    #[validate(
        required(message = "Age is required"),
        range(max = 150, message = "Age must be between 0 and 150")
    )]
    #[schema(example = 34)]
    pub age: Option<u32>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email address")
    )]
    #[schema(example = "asha@example.com")]
    pub email: Option<String>,

    #[validate(
        required(message = "Phone number is required"),
        custom(function = "validate_phone")
    )]
    #[schema(example = "9988776655")]
    pub phno: Option<String>,

    #[validate(
        required(message = "Address is required"),
        custom(function = "validate_not_blank"),
        length(max = 300, message = "Address must be at most 300 characters")
    )]
    pub address: Option<String>,

    #[validate(custom(function = "validate_sex"))]
    #[schema(example = "female")]
    pub sex: Option<String>,

    #[serde(default, rename = "medicalConcern")]
    #[validate(length(max = 50, message = "At most 50 medical concerns may be listed"))]
    pub medical_concern: Vec<String>,
}

impl CreatePatientRequest {
    /// Converts a request that has already passed `validate()`.
    pub fn into_new_patient(self) -> NewPatient {
        NewPatient {
            name: self.name.unwrap_or_default(),
            age: self.age.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phno: self.phno.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            sex: self.sex.as_deref().and_then(|s| s.parse::<Sex>().ok()),
            medical_concern: self.medical_concern,
        }
    }
}

fn deserialize_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AgeInput {
        Number(u32),
        Text(String),
    }

    match Option::<AgeInput>::deserialize(deserializer)? {
        None => Ok(None),
        Some(AgeInput::Number(n)) => Ok(Some(n)),
        Some(AgeInput::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(AgeInput::Text(s)) => s.trim().parse::<u32>().map(Some).map_err(|_| {
            serde::de::Error::custom(format!("age must be a whole number, got {:?}", s))
        }),
    }
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits = value.trim().strip_prefix('+').unwrap_or(value.trim());
    let valid = (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    if !valid {
        let mut err = ValidationError::new("phone");
        err.message = Some(Cow::from("Phone number must contain 7 to 15 digits"));
        return Err(err);
    }
    Ok(())
}

fn validate_sex(value: &str) -> Result<(), ValidationError> {
    value.parse::<Sex>().map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("sex");
        err.message = Some(Cow::from("Sex must be one of male, female, other"));
        err
    })
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PrescriptionInput {
    #[validate(
        required(message = "tablets is required"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Levothyroxine 50mcg")]
    pub tablets: Option<String>,

    #[validate(
        required(message = "dosage is required"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "1-0-0")]
    pub dosage: Option<String>,

    #[validate(
        required(message = "duration is required"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "30 days")]
    pub duration: Option<String>,

    /// Defaults to the time of the update when omitted.
    pub date: Option<DateTime<Utc>>,
}

impl PrescriptionInput {
    pub fn into_prescription(self) -> Prescription {
        Prescription::new(NewPrescription {
            tablets: self.tablets.unwrap_or_default(),
            dosage: self.dosage.unwrap_or_default(),
            duration: self.duration.unwrap_or_default(),
            date: self.date,
        })
    }
}

/// Body of `PUT /api/userDetails/:id`. Each list is appended to the field
/// of the same name; omitted lists leave that field untouched.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct AppendPrescriptionsRequest {
    #[serde(default)]
    #[validate(nested)]
    pub prescription: Vec<PrescriptionInput>,

    #[serde(default, rename = "newPrescription")]
    #[validate(nested)]
    pub new_prescription: Vec<PrescriptionInput>,
}

impl AppendPrescriptionsRequest {
    pub fn into_prescriptions(self) -> (Vec<Prescription>, Vec<Prescription>) {
        (
            self.prescription
                .into_iter()
                .map(PrescriptionInput::into_prescription)
                .collect(),
            self.new_prescription
                .into_iter()
                .map(PrescriptionInput::into_prescription)
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub tablets: String,
    pub dosage: String,
    pub duration: String,
    pub date: DateTime<Utc>,
}

impl From<Prescription> for PrescriptionResponse {
    fn from(p: Prescription) -> Self {
        Self {
            id: p.id.to_hex(),
            tablets: p.tablets,
            dosage: p.dosage,
            duration: p.duration,
            date: p.date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub age: u32,
    pub email: String,
    pub phno: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    pub medical_concern: Vec<String>,
    pub prescription: Vec<PrescriptionResponse>,
    pub new_prescription: Vec<PrescriptionResponse>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Patient> for PatientResponse {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id.to_hex(),
            name: p.name,
            age: p.age,
            email: p.email,
            phno: p.phno,
            address: p.address,
            sex: p.sex.map(|s| s.to_string()),
            medical_concern: p.medical_concern,
            prescription: p.prescription.into_iter().map(Into::into).collect(),
            new_prescription: p.new_prescription.into_iter().map(Into::into).collect(),
            is_completed: p.is_completed,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// `{ message, user }` envelope returned by create, update and complete.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientEnvelope {
    #[schema(example = "User created successfully")]
    pub message: String,
    pub user: PatientResponse,
}

impl PatientEnvelope {
    pub fn new(message: impl Into<String>, patient: Patient) -> Self {
        Self {
            message: message.into(),
            user: patient.into(),
        }
    }
}

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
            Sex::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            "other" => Ok(Sex::Other),
            _ => Err(format!("Invalid sex: {}", s)),
        }
    }
}

/// One medication line on a patient's chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub tablets: String,
    pub dosage: String,
    pub duration: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub tablets: String,
    pub dosage: String,
    pub duration: String,
    pub date: Option<DateTime<Utc>>,
}

impl Prescription {
    pub fn new(input: NewPrescription) -> Self {
        Self {
            id: ObjectId::new(),
            tablets: input.tablets.trim().to_string(),
            dosage: input.dosage.trim().to_string(),
            duration: input.duration.trim().to_string(),
            date: input
                .date
                .map(|d| mongodb::bson::DateTime::from_chrono(d).to_chrono())
                .unwrap_or_else(super::now),
        }
    }
}

/// Intake/consultation subject as stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub age: u32,
    pub email: String,
    pub phno: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub medical_concern: Vec<String>,
    #[serde(default)]
    pub prescription: Vec<Prescription>,
    #[serde(default)]
    pub new_prescription: Vec<Prescription>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub age: u32,
    pub email: String,
    pub phno: String,
    pub address: String,
    pub sex: Option<Sex>,
    pub medical_concern: Vec<String>,
}

impl Patient {
    pub fn new(input: NewPatient) -> Self {
        let now = super::now();
        Self {
            id: ObjectId::new(),
            name: input.name.trim().to_string(),
            age: input.age,
            email: input.email.trim().to_lowercase(),
            phno: input.phno.trim().to_string(),
            address: input.address.trim().to_string(),
            sex: input.sex,
            medical_concern: input
                .medical_concern
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            prescription: Vec::new(),
            new_prescription: Vec::new(),
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends to both prescription lists, preserving existing entries.
    pub fn append_prescriptions(
        &mut self,
        prescription: Vec<Prescription>,
        new_prescription: Vec<Prescription>,
    ) {
        if prescription.is_empty() && new_prescription.is_empty() {
            return;
        }
        self.prescription.extend(prescription);
        self.new_prescription.extend(new_prescription);
        self.updated_at = super::now();
    }

    pub fn mark_completed(&mut self) {
        self.is_completed = true;
        self.updated_at = super::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake() -> NewPatient {
        NewPatient {
            name: "  Asha Rao ".into(),
            age: 34,
            email: "Asha@Example.com".into(),
            phno: "9988776655".into(),
            address: "12 Lake Road".into(),
            sex: Some(Sex::Female),
            medical_concern: vec!["Thyroid".into(), "  ".into(), " Migraines ".into()],
        }
    }

    fn line(tablets: &str) -> Prescription {
        Prescription::new(NewPrescription {
            tablets: tablets.into(),
            dosage: "1-0-1".into(),
            duration: "5 days".into(),
            date: None,
        })
    }

    #[test]
    fn new_patient_is_normalized_and_pending() {
        let patient = Patient::new(intake());
        assert_eq!(patient.name, "Asha Rao");
        assert_eq!(patient.email, "asha@example.com");
        assert_eq!(patient.medical_concern, vec!["Thyroid", "Migraines"]);
        assert!(!patient.is_completed);
        assert!(patient.prescription.is_empty());
        assert!(patient.new_prescription.is_empty());
        assert_eq!(patient.created_at, patient.updated_at);
    }

    #[test]
    fn append_keeps_order_and_targets_each_list() {
        let mut patient = Patient::new(intake());
        patient.append_prescriptions(vec![line("Levothyroxine")], vec![]);
        patient.append_prescriptions(vec![line("Ibuprofen")], vec![line("Sumatriptan")]);

        let prior: Vec<_> = patient.prescription.iter().map(|p| p.tablets.as_str()).collect();
        assert_eq!(prior, vec!["Levothyroxine", "Ibuprofen"]);
        assert_eq!(patient.new_prescription.len(), 1);
        assert_eq!(patient.new_prescription[0].tablets, "Sumatriptan");
    }

    #[test]
    fn empty_append_leaves_record_untouched() {
        let mut patient = Patient::new(intake());
        let before = patient.clone();
        patient.append_prescriptions(vec![], vec![]);
        assert_eq!(patient, before);
    }

    #[test]
    fn sex_parses_loosely() {
        assert_eq!("Female".parse::<Sex>(), Ok(Sex::Female));
        assert_eq!(" m ".parse::<Sex>(), Ok(Sex::Male));
        assert!("unknown".parse::<Sex>().is_err());
    }

    #[test]
    fn bson_round_trip_keeps_field_names() {
        let patient = Patient::new(intake());
        let doc = mongodb::bson::to_document(&patient).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("medicalConcern"));
        assert!(doc.contains_key("newPrescription"));
        assert!(doc.contains_key("isCompleted"));
        assert!(doc.contains_key("createdAt"));

        let back: Patient = mongodb::bson::from_document(doc).unwrap();
        assert_eq!(back, patient);
    }
}

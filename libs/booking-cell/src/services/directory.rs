use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use shared_database::{paths, RealtimeStore};
use shared_models::doctor::Doctor;

use crate::BookingError;

/// A doctor profile together with its key under `doctors/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorEntry {
    pub id: String,
    #[serde(flatten)]
    pub profile: Doctor,
}

/// Read-only browsing of the doctor directory: by department, by hospital,
/// or one profile at a time.
pub struct DoctorDirectoryService {
    store: Arc<dyn RealtimeStore>,
}

impl DoctorDirectoryService {
    pub fn new(store: Arc<dyn RealtimeStore>) -> Self {
        Self { store }
    }

    /// Every doctor in key order. Records that are not doctor profiles are skipped.
    pub async fn list_doctors(&self) -> Result<Vec<DoctorEntry>, BookingError> {
        let Some(Value::Object(records)) = self.store.read(paths::DOCTORS_ROOT).await? else {
            return Ok(Vec::new());
        };

        let doctors: Vec<DoctorEntry> = records
            .into_iter()
            .filter_map(|(id, record)| match serde_json::from_value::<Doctor>(record) {
                Ok(profile) => Some(DoctorEntry { id, profile }),
                Err(e) => {
                    warn!("Skipping malformed doctor record {}: {}", id, e);
                    None
                }
            })
            .collect();

        debug!("Loaded {} doctors", doctors.len());
        Ok(doctors)
    }

    pub async fn get_doctor(&self, doctor_id: &str) -> Result<DoctorEntry, BookingError> {
        match self.store.read(&paths::doctor(doctor_id)).await? {
            Some(record @ Value::Object(_)) => Ok(DoctorEntry {
                id: doctor_id.to_string(),
                profile: serde_json::from_value(record)?,
            }),
            _ => Err(BookingError::DoctorNotFound(doctor_id.to_string())),
        }
    }

    /// Distinct department names, trimmed and sorted.
    pub async fn departments(&self) -> Result<Vec<String>, BookingError> {
        let doctors = self.list_doctors().await?;
        Ok(distinct(doctors.iter().map(|d| d.profile.department.as_deref())))
    }

    pub async fn doctors_in_department(&self, department: &str) -> Result<Vec<DoctorEntry>, BookingError> {
        let doctors = self.list_doctors().await?;
        Ok(doctors
            .into_iter()
            .filter(|d| same_name(d.profile.department.as_deref(), department))
            .collect())
    }

    /// Distinct hospital names, trimmed and sorted. A non-blank `search`
    /// keeps only names containing it, ignoring case.
    pub async fn hospitals(&self, search: Option<&str>) -> Result<Vec<String>, BookingError> {
        let doctors = self.list_doctors().await?;
        let hospitals = distinct(doctors.iter().map(|d| d.profile.hospital.as_deref()));

        match search.filter(|s| !s.trim().is_empty()) {
            Some(search) => {
                let needle = search.to_lowercase();
                Ok(hospitals.into_iter().filter(|h| h.to_lowercase().contains(&needle)).collect())
            }
            None => Ok(hospitals),
        }
    }

    pub async fn doctors_in_hospital(&self, hospital: &str) -> Result<Vec<DoctorEntry>, BookingError> {
        let doctors = self.list_doctors().await?;
        Ok(doctors
            .into_iter()
            .filter(|d| same_name(d.profile.hospital.as_deref(), hospital))
            .collect())
    }
}

fn distinct<'a>(names: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    names
        .flatten()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Trimmed, case-insensitive comparison; a missing name matches only a blank one.
fn same_name(field: Option<&str>, wanted: &str) -> bool {
    field.unwrap_or_default().trim().to_lowercase() == wanted.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_trims_and_sorts() {
        let names = [Some(" Cardiology "), None, Some("Neurology"), Some("   "), Some("Cardiology")];
        assert_eq!(distinct(names.into_iter()), vec!["Cardiology", "Neurology"]);
    }

    #[test]
    fn names_compare_without_case_or_padding() {
        assert!(same_name(Some("  Square Hospital"), "square hospital "));
        assert!(!same_name(Some("Square Hospital"), "Square"));
        assert!(!same_name(None, "Square Hospital"));
    }
}

use serde::{Deserialize, Serialize};

use shared_models::serde_helpers::string_or_number;
use shared_models::Doctor;

/// Fields made available to the acceptance e-mail template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceTemplate {
    pub patient_email: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub doctor_degree: String,
    pub department: String,
    pub hospital: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub appointment_duration: String,
    pub serial_number: String,
    pub accepted_at: String,
}

impl AcceptanceTemplate {
    /// Fill doctor fields that are still blank from the doctor's profile.
    pub fn with_doctor(mut self, doctor: &Doctor) -> Self {
        fill(&mut self.doctor_name, doctor.display_name());
        fill(&mut self.doctor_degree, doctor.degree.as_deref());
        fill(&mut self.department, doctor.department.as_deref());
        fill(&mut self.hospital, doctor.hospital.as_deref());
        self
    }

    pub fn summary(&self) -> String {
        format!(
            "Dear {}, your appointment with Dr. {} is confirmed for {} at {} ({}). Serial: {}",
            self.patient_name,
            self.doctor_name,
            self.appointment_date,
            self.appointment_time,
            self.appointment_duration,
            self.serial_number,
        )
    }
}

fn fill(slot: &mut String, value: Option<&str>) {
    if slot.trim().is_empty() {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            *slot = value.to_string();
        }
    }
}

/// The subset of a booking record the SMS trigger looks at.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusView {
    #[serde(skip)]
    pub doctor_id: String,
    #[serde(skip)]
    pub booking_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone: String,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub serial_number: Option<u32>,
    #[serde(default)]
    pub appointment_time: Option<String>,
}

impl BookingStatusView {
    pub fn is_accepted(&self) -> bool {
        self.status.as_deref() == Some("accepted")
    }

    /// E.164 style destination; stored numbers carry the country code
    /// without the leading plus.
    pub fn sms_destination(&self) -> Option<String> {
        let digits = self.phone.trim().trim_start_matches('+');
        (!digits.is_empty()).then(|| format!("+{}", digits))
    }

    pub fn confirmation_message(&self, doctor_name: &str) -> String {
        format!(
            "Hello {}, your appointment with Dr. {} is confirmed.\nSerial: {}\nTime: {}",
            self.patient_name,
            doctor_name,
            self.serial_number.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            self.appointment_time.as_deref().unwrap_or("-"),
        )
    }
}

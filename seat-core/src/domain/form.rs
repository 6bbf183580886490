use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Every key that can carry an error message in the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    FullName,
    Dob,
    Email,
    ContactNumber,
    Institution,
    City,
    Location,
    Slot,
    Otp,
    General,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::FullName => "fullName",
            FormField::Dob => "dob",
            FormField::Email => "email",
            FormField::ContactNumber => "contactNumber",
            FormField::Institution => "institution",
            FormField::City => "city",
            FormField::Location => "location",
            FormField::Slot => "slot",
            FormField::Otp => "otp",
            FormField::General => "general",
        }
    }

    /// Fields owned by the submit-time validation pass
    pub const VALIDATED: [FormField; 8] = [
        FormField::FullName,
        FormField::Dob,
        FormField::Email,
        FormField::ContactNumber,
        FormField::Institution,
        FormField::City,
        FormField::Location,
        FormField::Slot,
    ];
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text inputs of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    FullName,
    Dob,
    Email,
    ContactNumber,
    Institution,
}

impl TextField {
    pub fn error_key(&self) -> FormField {
        match self {
            TextField::FullName => FormField::FullName,
            TextField::Dob => FormField::Dob,
            TextField::Email => FormField::Email,
            TextField::ContactNumber => FormField::ContactNumber,
            TextField::Institution => FormField::Institution,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDetails {
    pub full_name: String,
    pub dob: String,
    pub email: String,
    pub contact_number: String,
    pub institution: String,
}

impl FormDetails {
    pub fn get(&self, field: TextField) -> &str {
        match field {
            TextField::FullName => &self.full_name,
            TextField::Dob => &self.dob,
            TextField::Email => &self.email,
            TextField::ContactNumber => &self.contact_number,
            TextField::Institution => &self.institution,
        }
    }

    pub fn set(&mut self, field: TextField, value: impl Into<String>) {
        let slot = match field {
            TextField::FullName => &mut self.full_name,
            TextField::Dob => &mut self.dob,
            TextField::Email => &mut self.email,
            TextField::ContactNumber => &mut self.contact_number,
            TextField::Institution => &mut self.institution,
        };
        *slot = value.into();
    }
}

/// Field name → human-readable message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorState {
    messages: BTreeMap<FormField, String>,
}

impl ErrorState {
    pub fn set(&mut self, field: FormField, message: impl Into<String>) {
        self.messages.insert(field, message.into());
    }

    pub fn clear(&mut self, field: FormField) {
        self.messages.remove(&field);
    }

    pub fn clear_all(&mut self) {
        self.messages.clear();
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.messages.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.messages.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.messages.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Replace the validated fields with the result of a new validation pass.
    /// `otp` and `general` are left alone.
    pub fn replace_validated(&mut self, fresh: ErrorState) {
        for field in FormField::VALIDATED {
            self.messages.remove(&field);
        }
        self.messages.extend(fresh.messages);
    }
}

/// Body of the registration POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationPayload {
    pub full_name: String,
    pub dob: String,
    pub email: String,
    pub contact_number: String,
    pub institution: String,
    pub city_id: String,
    pub location_id: String,
    pub appointment_id: String,
}

impl RegistrationPayload {
    pub fn from_form(form: &FormDetails, city_id: &str, location_id: &str, slot_id: &str) -> Self {
        Self {
            full_name: form.full_name.trim().to_string(),
            dob: form.dob.trim().to_string(),
            email: form.email.trim().to_string(),
            contact_number: form.contact_number.trim().to_string(),
            institution: form.institution.trim().to_string(),
            city_id: city_id.to_string(),
            location_id: location_id.to_string(),
            appointment_id: slot_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_state_serializes_with_form_keys() {
        let mut errors = ErrorState::default();
        errors.set(FormField::ContactNumber, "Please enter your mobile number.");
        errors.set(FormField::General, "Please fix the errors above.");

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value["contactNumber"], "Please enter your mobile number.");
        assert_eq!(value["general"], "Please fix the errors above.");
    }

    #[test]
    fn replace_validated_keeps_otp_and_general() {
        let mut errors = ErrorState::default();
        errors.set(FormField::FullName, "old");
        errors.set(FormField::City, "old");
        errors.set(FormField::Otp, "Invalid OTP");

        let mut fresh = ErrorState::default();
        fresh.set(FormField::City, "Please select a city.");
        errors.replace_validated(fresh);

        assert!(!errors.contains(FormField::FullName));
        assert_eq!(errors.get(FormField::City), Some("Please select a city."));
        assert_eq!(errors.get(FormField::Otp), Some("Invalid OTP"));
    }

    #[test]
    fn payload_trims_text_fields() {
        let form = FormDetails {
            full_name: "  Asha Rao ".into(),
            dob: "2001-04-02".into(),
            email: " asha@example.com ".into(),
            contact_number: " 9876543210".into(),
            institution: "IIT ".into(),
        };
        let payload = RegistrationPayload::from_form(&form, "1", "10", "100");
        assert_eq!(payload.full_name, "Asha Rao");
        assert_eq!(payload.email, "asha@example.com");
        assert_eq!(payload.contact_number, "9876543210");
        assert_eq!(payload.institution, "IIT");
        assert_eq!(payload.appointment_id, "100");
    }
}

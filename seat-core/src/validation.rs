//! Field rules for the registration form.

use crate::cascade::SelectionState;
use crate::dates::{age_on, parse_dob};
use crate::domain::{ErrorState, FormDetails, FormField, TextField};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_AGE_YEARS: i32 = 13;

pub const FIX_ERRORS_MESSAGE: &str = "Please fix the errors above.";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone pattern compiles"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Ten to fifteen digits with an optional leading `+`. Spaces, dashes and
/// parentheses are ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    PHONE_RE.is_match(&compact)
}

/// Check a single text input. `today` anchors the minimum-age rule.
pub fn check_text_field(field: TextField, value: &str, today: NaiveDate) -> Result<(), &'static str> {
    let trimmed = value.trim();
    match field {
        TextField::FullName => {
            if trimmed.is_empty() {
                return Err("Please enter your full name.");
            }
        }
        TextField::Dob => {
            if trimmed.is_empty() {
                return Err("Please select your date of birth.");
            }
            let dob = parse_dob(trimmed).map_err(|_| "Please enter a valid date of birth.")?;
            if age_on(dob, today) < MIN_AGE_YEARS {
                return Err("You must be at least 13 years old to register.");
            }
        }
        TextField::Email => {
            if trimmed.is_empty() {
                return Err("Please enter your email.");
            }
            if !is_valid_email(trimmed) {
                return Err("Please enter a valid email address.");
            }
        }
        TextField::ContactNumber => {
            if trimmed.is_empty() {
                return Err("Please enter your mobile number.");
            }
            if !is_valid_phone(trimmed) {
                return Err("Please enter a valid mobile number.");
            }
        }
        TextField::Institution => {
            if trimmed.is_empty() {
                return Err("Please enter your institution.");
            }
        }
    }
    Ok(())
}

const TEXT_FIELDS: [TextField; 5] = [
    TextField::FullName,
    TextField::Dob,
    TextField::Email,
    TextField::ContactNumber,
    TextField::Institution,
];

/// Full submit-time pass. Every violated field gets its own entry; an empty
/// result means the form may be sent.
pub fn validate_form(form: &FormDetails, selection: &SelectionState, today: NaiveDate) -> ErrorState {
    let mut errors = ErrorState::default();

    for field in TEXT_FIELDS {
        if let Err(message) = check_text_field(field, form.get(field), today) {
            errors.set(field.error_key(), message);
        }
    }
    if selection.city.is_none() {
        errors.set(FormField::City, "Please select a city.");
    }
    if selection.location.is_none() {
        errors.set(FormField::Location, "Please select a location/center.");
    }
    if selection.slot.is_none() {
        errors.set(FormField::Slot, "Please select a slot.");
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 22).unwrap()
    }

    fn valid_form() -> FormDetails {
        FormDetails {
            full_name: "Asha Rao".into(),
            dob: "2004-05-17".into(),
            email: "asha@example.com".into(),
            contact_number: "+91 98765 43210".into(),
            institution: "Government College".into(),
        }
    }

    fn full_selection() -> SelectionState {
        SelectionState {
            city: Some("1".into()),
            location: Some("10".into()),
            slot: Some("100".into()),
        }
    }

    #[test]
    fn complete_form_has_no_errors() {
        assert!(validate_form(&valid_form(), &full_selection(), today()).is_empty());
    }

    #[test]
    fn collects_every_violation() {
        let mut form = valid_form();
        form.full_name = "   ".into();
        let selection = SelectionState::default();

        let errors = validate_form(&form, &selection, today());
        assert!(errors.contains(FormField::FullName));
        assert!(errors.contains(FormField::City));
        assert!(errors.contains(FormField::Location));
        assert!(errors.contains(FormField::Slot));
        assert!(!errors.contains(FormField::Email));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn exactly_thirteen_is_old_enough() {
        let t = today();
        let dob = NaiveDate::from_ymd_opt(t.year() - 13, t.month(), t.day()).unwrap();
        assert!(check_text_field(TextField::Dob, &dob.format("%Y-%m-%d").to_string(), t).is_ok());

        let one_day_short = dob + Duration::days(1);
        assert_eq!(
            check_text_field(TextField::Dob, &one_day_short.format("%Y-%m-%d").to_string(), t),
            Err("You must be at least 13 years old to register.")
        );
    }

    #[test]
    fn dob_must_parse() {
        assert_eq!(
            check_text_field(TextField::Dob, "17/05/2004", today()),
            Err("Please enter a valid date of birth.")
        );
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("  first.last+tag@uni.ac.in "));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
    }

    #[test]
    fn phone_format() {
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("+91 98765-43210"));
        assert!(is_valid_phone("(022) 2345 6789"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("98765abc10"));
    }
}

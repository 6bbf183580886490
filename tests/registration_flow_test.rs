use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use seat_core::domain::{AuthToken, Catalog, FormField, RegistrationPayload, TextField};
use seat_core::storage::{FileTokenStore, TokenStore};
use seat_registrar::apis::{ApiEnvelope, RegistrationReceipt, VerifyOtpData};
use seat_registrar::app::ports::RegistrationApiPort;
use seat_registrar::infra::http_client::decode_envelope;
use seat_registrar::pipeline::{
    OtpRequestOutcome, OtpVerifyOutcome, RegistrationPhase, RegistrationPipeline, SubmitOutcome,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Backend double that answers with raw JSON bodies, decoded the same way the
/// HTTP client decodes them.
#[derive(Default)]
struct ScriptedBackend {
    payloads: Mutex<Vec<RegistrationPayload>>,
    tokens: Mutex<Vec<String>>,
}

#[async_trait]
impl RegistrationApiPort for ScriptedBackend {
    async fn request_otp(&self, email: &str) -> seat_registrar::error::Result<ApiEnvelope<bool>> {
        let body = json!({ "status": true, "status_code": 200, "message": format!("OTP sent to {}", email), "data": true });
        decode_envelope(200, body.to_string().as_bytes())
    }

    async fn verify_otp(&self, _email: &str, otp: &str) -> seat_registrar::error::Result<ApiEnvelope<VerifyOtpData>> {
        if otp == "123456" {
            let body = json!({ "status": true, "status_code": 200, "data": "tok1" });
            decode_envelope(200, body.to_string().as_bytes())
        } else {
            let body = json!({ "status": false, "status_code": 400, "message": "Invalid OTP" });
            decode_envelope(400, body.to_string().as_bytes())
        }
    }

    async fn register(
        &self,
        token: &AuthToken,
        payload: &RegistrationPayload,
    ) -> seat_registrar::error::Result<ApiEnvelope<RegistrationReceipt>> {
        self.tokens.lock().unwrap().push(token.as_str().to_string());
        self.payloads.lock().unwrap().push(payload.clone());
        let body = json!({ "status": true, "status_code": 201, "data": { "registration_id": "R1" } });
        decode_envelope(201, body.to_string().as_bytes())
    }
}

fn catalog() -> Result<Catalog> {
    Ok(serde_json::from_value(json!([
        {
            "id": 1,
            "name": "Mumbai",
            "locations": [
                { "id": 10, "name": "Andheri", "appointments": [ { "id": 100, "name": "Morning" } ] },
                { "id": 11, "name": "Bandra", "slots": [] }
            ]
        },
        { "id": "2", "name": "Pune", "locations": [] }
    ]))?)
}

#[tokio::test]
async fn test_otp_gated_registration_end_to_end() -> Result<()> {
    let dir = tempdir()?;
    let token_path = dir.path().join("storage.json");
    let backend = Arc::new(ScriptedBackend::default());
    let store = Arc::new(FileTokenStore::new(&token_path));
    let pipeline = RegistrationPipeline::new(catalog()?, backend.clone(), store.clone());
    let today = NaiveDate::from_ymd_opt(2025, 8, 22).unwrap();

    pipeline.set_field(TextField::FullName, "  Asha Rao ");
    pipeline.set_field(TextField::Dob, "2004-05-17");
    pipeline.set_field(TextField::Email, "a@b.com");
    pipeline.set_field(TextField::ContactNumber, "+91 98765 43210");
    pipeline.set_field(TextField::Institution, "Government College");
    pipeline.select_city("1");
    pipeline.select_location("10");
    pipeline.select_slot("100");

    // Nothing goes out before the email is verified
    assert_eq!(pipeline.submit_on(today).await, SubmitOutcome::Unverified);
    assert!(backend.payloads.lock().unwrap().is_empty());

    assert_eq!(pipeline.request_otp().await, OtpRequestOutcome::Sent);
    assert_eq!(pipeline.phase(), RegistrationPhase::OtpRequested);
    assert!(pipeline.snapshot().otp_dialog_open);

    pipeline.set_otp_code("999999");
    assert_eq!(pipeline.verify_otp().await, OtpVerifyOutcome::Rejected);
    assert_eq!(pipeline.errors().get(FormField::Otp), Some("Invalid OTP"));
    assert_eq!(pipeline.phase(), RegistrationPhase::OtpRequested);

    pipeline.set_otp_code("123456");
    assert_eq!(pipeline.verify_otp().await, OtpVerifyOutcome::Verified);
    assert_eq!(pipeline.phase(), RegistrationPhase::OtpVerified);
    assert_eq!(store.load()?, Some(AuthToken::new("tok1")));

    let outcome = pipeline.submit_on(today).await;
    match outcome {
        SubmitOutcome::Registered(receipt) => assert_eq!(receipt.registration_id.as_deref(), Some("R1")),
        other => panic!("expected registration, got {:?}", other),
    }

    let payloads = backend.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].full_name, "Asha Rao");
    assert_eq!(payloads[0].city_id, "1");
    assert_eq!(payloads[0].location_id, "10");
    assert_eq!(payloads[0].appointment_id, "100");
    assert_eq!(*backend.tokens.lock().unwrap(), vec!["tok1".to_string()]);

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.phase, RegistrationPhase::Editing);
    assert!(snapshot.form.full_name.is_empty());
    assert!(!snapshot.verified);
    assert_eq!(store.load()?, None);

    Ok(())
}

#[tokio::test]
async fn test_stored_token_resumes_verified_session() -> Result<()> {
    let dir = tempdir()?;
    let token_path = dir.path().join("storage.json");
    FileTokenStore::new(&token_path).save(&AuthToken::new("tok1"))?;

    let backend = Arc::new(ScriptedBackend::default());
    let pipeline = RegistrationPipeline::new(catalog()?, backend, Arc::new(FileTokenStore::new(&token_path)));

    assert!(pipeline.is_verified());
    assert_eq!(pipeline.phase(), RegistrationPhase::OtpVerified);
    Ok(())
}

#[tokio::test]
async fn test_location_without_slots_cannot_be_submitted() -> Result<()> {
    let backend = Arc::new(ScriptedBackend::default());
    let store = Arc::new(seat_core::storage::InMemoryTokenStore::with_token(AuthToken::new("tok1")));
    let pipeline = RegistrationPipeline::new(catalog()?, backend.clone(), store);
    let today = NaiveDate::from_ymd_opt(2025, 8, 22).unwrap();

    pipeline.set_field(TextField::FullName, "Asha Rao");
    pipeline.set_field(TextField::Dob, "2004-05-17");
    pipeline.set_field(TextField::Email, "a@b.com");
    pipeline.set_field(TextField::ContactNumber, "9876543210");
    pipeline.set_field(TextField::Institution, "Government College");
    pipeline.select_city("1");
    pipeline.select_location("11");

    assert!(pipeline.snapshot().slots.is_empty());
    assert_eq!(pipeline.submit_on(today).await, SubmitOutcome::Invalid);
    assert_eq!(pipeline.errors().get(FormField::Slot), Some("Please select a slot."));
    assert!(backend.payloads.lock().unwrap().is_empty());
    Ok(())
}

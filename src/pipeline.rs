//! OTP-gated registration state machine.
//!
//! All state sits behind one mutex that is only held between awaits, so field
//! edits keep working while an OTP or submit round trip is in flight. OTP and
//! submit each have their own busy flag; a second call of the same kind while
//! one is pending returns `Busy` without touching the network.

use crate::apis::RegistrationReceipt;
use crate::app::ports::RegistrationApiPort;
use crate::constants;
use chrono::{Local, NaiveDate};
use metrics::counter;
use seat_core::cascade::{CatalogCascade, SelectionState};
use seat_core::domain::{
    AuthToken, Catalog, DropdownOption, ErrorState, FormDetails, FormField, RegistrationPayload, TextField,
};
use seat_core::storage::TokenStore;
use seat_core::validation::{self, FIX_ERRORS_MESSAGE};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegistrationPhase {
    Editing,
    OtpRequested,
    OtpVerified,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpRequestOutcome {
    /// Backend accepted; the OTP dialog is open.
    Sent,
    /// Email missing or malformed, nothing was sent.
    Invalid,
    /// Backend refused or the call failed; see the `email` error.
    Rejected,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerifyOutcome {
    Verified,
    Invalid,
    Rejected,
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Registration accepted and all state reset.
    Registered(RegistrationReceipt),
    /// Validation failed; no request was sent.
    Invalid,
    /// No auth token; no request was sent.
    Unverified,
    /// Backend refused or the call failed. Token kept for a retry.
    Failed,
    Busy,
}

/// Read-only view of the form for rendering
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationSnapshot {
    pub phase: RegistrationPhase,
    pub form: FormDetails,
    pub selection: SelectionState,
    pub cities: Vec<DropdownOption>,
    pub locations: Vec<DropdownOption>,
    pub slots: Vec<DropdownOption>,
    pub errors: ErrorState,
    pub otp_dialog_open: bool,
    pub otp_code: String,
    pub otp_busy: bool,
    pub submit_busy: bool,
    pub verified: bool,
    pub last_registration_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum BusyFlag {
    Otp,
    Submit,
}

#[derive(Debug)]
struct FormState {
    phase: RegistrationPhase,
    form: FormDetails,
    cascade: CatalogCascade,
    errors: ErrorState,
    token: Option<AuthToken>,
    otp_dialog_open: bool,
    otp_code: String,
    otp_busy: bool,
    submit_busy: bool,
    last_registration_id: Option<String>,
}

impl FormState {
    fn new(catalog: Catalog, token: Option<AuthToken>) -> Self {
        let phase = if token.is_some() {
            RegistrationPhase::OtpVerified
        } else {
            RegistrationPhase::Editing
        };
        Self {
            phase,
            form: FormDetails::default(),
            cascade: CatalogCascade::new(catalog),
            errors: ErrorState::default(),
            token,
            otp_dialog_open: false,
            otp_code: String::new(),
            otp_busy: false,
            submit_busy: false,
            last_registration_id: None,
        }
    }

    fn busy(&mut self, flag: BusyFlag) -> &mut bool {
        match flag {
            BusyFlag::Otp => &mut self.otp_busy,
            BusyFlag::Submit => &mut self.submit_busy,
        }
    }

    /// Back to a blank form. The catalog stays loaded; busy flags belong to
    /// whichever call is still in flight.
    fn reset(&mut self) {
        self.phase = RegistrationPhase::Editing;
        self.form = FormDetails::default();
        self.cascade.clear_selection();
        self.errors.clear_all();
        self.token = None;
        self.otp_dialog_open = false;
        self.otp_code.clear();
    }
}

fn options<'a, I>(items: I) -> Vec<DropdownOption>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    items
        .into_iter()
        .map(|(id, name)| DropdownOption {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Clears its busy flag when dropped, however the call ends.
struct BusyGuard<'a> {
    state: &'a Mutex<FormState>,
    flag: BusyFlag,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state.busy(self.flag) = false;
    }
}

pub struct RegistrationPipeline {
    api: Arc<dyn RegistrationApiPort>,
    tokens: Arc<dyn TokenStore>,
    state: Mutex<FormState>,
}

impl RegistrationPipeline {
    /// Start a session over `catalog`. A token already in the store counts as
    /// a verified email.
    pub fn new(catalog: Catalog, api: Arc<dyn RegistrationApiPort>, tokens: Arc<dyn TokenStore>) -> Self {
        let token = match tokens.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read stored auth token: {}", e);
                None
            }
        };
        if token.is_some() {
            debug!("Resuming with a stored auth token");
        }
        Self {
            api,
            tokens,
            state: Mutex::new(FormState::new(catalog, token)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, flag: BusyFlag) -> Option<BusyGuard<'_>> {
        let mut state = self.lock();
        let busy = state.busy(flag);
        if *busy {
            return None;
        }
        *busy = true;
        Some(BusyGuard {
            state: &self.state,
            flag,
        })
    }

    pub fn snapshot(&self) -> RegistrationSnapshot {
        let state = self.lock();
        let cascade = &state.cascade;
        RegistrationSnapshot {
            phase: state.phase,
            form: state.form.clone(),
            selection: cascade.selection().clone(),
            cities: options(cascade.cities().iter().map(|c| (c.id.as_str(), c.name.as_str()))),
            locations: options(cascade.locations().iter().map(|l| (l.id.as_str(), l.name.as_str()))),
            slots: options(cascade.slots().iter().map(|s| (s.id.as_str(), s.name.as_str()))),
            errors: state.errors.clone(),
            otp_dialog_open: state.otp_dialog_open,
            otp_code: state.otp_code.clone(),
            otp_busy: state.otp_busy,
            submit_busy: state.submit_busy,
            verified: state.token.is_some(),
            last_registration_id: state.last_registration_id.clone(),
        }
    }

    pub fn phase(&self) -> RegistrationPhase {
        self.lock().phase
    }

    pub fn errors(&self) -> ErrorState {
        self.lock().errors.clone()
    }

    pub fn is_verified(&self) -> bool {
        self.lock().token.is_some()
    }

    /// Store user input. An existing error on the field is dropped once the
    /// new value passes that field's rule.
    pub fn set_field(&self, field: TextField, value: impl Into<String>) {
        let today = Local::now().date_naive();
        let mut state = self.lock();
        state.form.set(field, value);
        let key = field.error_key();
        if state.errors.contains(key) && validation::check_text_field(field, state.form.get(field), today).is_ok() {
            state.errors.clear(key);
        }
    }

    pub fn replace_catalog(&self, catalog: Catalog) {
        self.lock().cascade.replace_catalog(catalog);
    }

    pub fn select_city(&self, city_id: &str) {
        let mut state = self.lock();
        state.cascade.select_city(city_id);
        if state.cascade.selection().city.is_some() {
            state.errors.clear(FormField::City);
        }
    }

    pub fn select_location(&self, location_id: &str) {
        let mut state = self.lock();
        state.cascade.select_location(location_id);
        if state.cascade.selection().location.is_some() {
            state.errors.clear(FormField::Location);
        }
    }

    pub fn select_slot(&self, slot_id: &str) {
        let mut state = self.lock();
        state.cascade.select_slot(slot_id);
        if state.cascade.selection().slot.is_some() {
            state.errors.clear(FormField::Slot);
        }
    }

    pub fn set_otp_code(&self, code: impl Into<String>) {
        self.lock().otp_code = code.into();
    }

    /// Hide the dialog and forget what was typed into it. An in-flight
    /// request is not affected.
    pub fn close_otp_dialog(&self) {
        let mut state = self.lock();
        state.otp_dialog_open = false;
        state.otp_code.clear();
        state.errors.clear(FormField::Otp);
    }

    #[instrument(skip(self))]
    pub async fn request_otp(&self) -> OtpRequestOutcome {
        let Some(_busy) = self.begin(BusyFlag::Otp) else {
            return OtpRequestOutcome::Busy;
        };

        let email = {
            let mut state = self.lock();
            let email = state.form.email.trim().to_string();
            if email.is_empty() {
                state.errors.set(FormField::Email, constants::EMAIL_REQUIRED_FOR_OTP);
                return OtpRequestOutcome::Invalid;
            }
            if !validation::is_valid_email(&email) {
                state.errors.set(FormField::Email, "Please enter a valid email address.");
                return OtpRequestOutcome::Invalid;
            }
            state.errors.clear(FormField::Email);
            email
        };

        let result = self.api.request_otp(&email).await;
        let mut state = self.lock();
        match result {
            Ok(envelope) if envelope.status => {
                info!("OTP sent");
                counter!("registrar_otp_requests_total", "outcome" => "sent").increment(1);
                state.phase = match state.phase {
                    RegistrationPhase::Editing => RegistrationPhase::OtpRequested,
                    phase => phase,
                };
                state.otp_dialog_open = true;
                state.otp_code.clear();
                state.errors.clear(FormField::Otp);
                OtpRequestOutcome::Sent
            }
            Ok(envelope) => {
                warn!(status_code = envelope.status_code, "OTP request rejected");
                counter!("registrar_otp_requests_total", "outcome" => "rejected").increment(1);
                state
                    .errors
                    .set(FormField::Email, envelope.message_or(constants::OTP_SEND_FAILED));
                OtpRequestOutcome::Rejected
            }
            Err(e) => {
                warn!("OTP request failed: {}", e);
                counter!("registrar_otp_requests_total", "outcome" => "error").increment(1);
                state.errors.set(FormField::Email, constants::OTP_SEND_ERROR);
                OtpRequestOutcome::Rejected
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn verify_otp(&self) -> OtpVerifyOutcome {
        let Some(_busy) = self.begin(BusyFlag::Otp) else {
            return OtpVerifyOutcome::Busy;
        };

        let (email, code) = {
            let mut state = self.lock();
            if state.phase == RegistrationPhase::Editing {
                state.errors.set(FormField::Otp, constants::OTP_NOT_REQUESTED);
                return OtpVerifyOutcome::Invalid;
            }
            let email = state.form.email.trim().to_string();
            let code = state.otp_code.trim().to_string();
            if email.is_empty() || code.is_empty() {
                state.errors.set(FormField::Otp, constants::OTP_REQUIRED);
                return OtpVerifyOutcome::Invalid;
            }
            state.errors.clear(FormField::Otp);
            (email, code)
        };

        let result = self.api.verify_otp(&email, &code).await;
        let token = match result {
            Ok(envelope) if envelope.status => {
                let token = envelope
                    .data
                    .as_ref()
                    .map(|d| d.token().trim())
                    .filter(|t| !t.is_empty())
                    .map(AuthToken::new);
                if token.is_none() {
                    warn!("OTP accepted but no token was returned");
                    self.lock().errors.set(FormField::Otp, constants::GENERIC_FAILURE);
                }
                token
            }
            Ok(envelope) => {
                warn!(status_code = envelope.status_code, "OTP verification rejected");
                self.lock()
                    .errors
                    .set(FormField::Otp, envelope.message_or(constants::OTP_INVALID));
                None
            }
            Err(e) => {
                warn!("OTP verification failed: {}", e);
                self.lock().errors.set(FormField::Otp, constants::OTP_VERIFY_ERROR);
                None
            }
        };

        let Some(token) = token else {
            counter!("registrar_otp_verifications_total", "outcome" => "rejected").increment(1);
            return OtpVerifyOutcome::Rejected;
        };

        if let Err(e) = self.tokens.save(&token) {
            warn!("Could not persist auth token: {}", e);
        }
        let mut state = self.lock();
        state.token = Some(token);
        state.phase = RegistrationPhase::OtpVerified;
        state.otp_dialog_open = false;
        state.otp_code.clear();
        state.errors.clear(FormField::Otp);
        info!("Email verified");
        counter!("registrar_otp_verifications_total", "outcome" => "verified").increment(1);
        OtpVerifyOutcome::Verified
    }

    /// Validate, check for a token, then send the registration.
    pub async fn submit(&self) -> SubmitOutcome {
        self.submit_on(Local::now().date_naive()).await
    }

    /// `submit` with an explicit "today" for the minimum-age rule.
    #[instrument(skip(self))]
    pub async fn submit_on(&self, today: NaiveDate) -> SubmitOutcome {
        let Some(_busy) = self.begin(BusyFlag::Submit) else {
            return SubmitOutcome::Busy;
        };

        let (token, payload) = {
            let mut state = self.lock();
            let fresh = validation::validate_form(&state.form, state.cascade.selection(), today);
            let invalid = !fresh.is_empty();
            state.errors.replace_validated(fresh);
            if invalid {
                debug!(errors = state.errors.len(), "registration form invalid");
                state.errors.set(FormField::General, FIX_ERRORS_MESSAGE);
                counter!("registrar_registrations_total", "outcome" => "invalid").increment(1);
                return SubmitOutcome::Invalid;
            }

            let Some(token) = state.token.clone() else {
                state.errors.set(FormField::General, constants::VERIFY_EMAIL_FIRST);
                counter!("registrar_registrations_total", "outcome" => "unverified").increment(1);
                return SubmitOutcome::Unverified;
            };

            let selection = state.cascade.selection();
            let (Some(city), Some(location), Some(slot)) = (
                selection.city.as_deref(),
                selection.location.as_deref(),
                selection.slot.as_deref(),
            ) else {
                return SubmitOutcome::Invalid;
            };
            let payload = RegistrationPayload::from_form(&state.form, city, location, slot);

            state.errors.clear(FormField::General);
            state.phase = RegistrationPhase::Submitting;
            (token, payload)
        };

        let failure = match self.api.register(&token, &payload).await {
            Ok(envelope) if envelope.status => {
                let receipt = envelope.data.unwrap_or_default();
                self.finish_registration(&receipt);
                return SubmitOutcome::Registered(receipt);
            }
            Ok(envelope) => {
                warn!(status_code = envelope.status_code, "Registration rejected");
                envelope.message_or(constants::GENERIC_FAILURE)
            }
            Err(e) => {
                warn!("Registration request failed: {}", e);
                constants::GENERIC_FAILURE.to_string()
            }
        };

        counter!("registrar_registrations_total", "outcome" => "failed").increment(1);
        let mut state = self.lock();
        if state.phase == RegistrationPhase::Submitting {
            state.phase = RegistrationPhase::OtpVerified;
        }
        state.errors.set(FormField::General, failure);
        SubmitOutcome::Failed
    }

    fn finish_registration(&self, receipt: &RegistrationReceipt) {
        info!(registration_id = ?receipt.registration_id, "Registration accepted");
        counter!("registrar_registrations_total", "outcome" => "registered").increment(1);
        if let Err(e) = self.tokens.clear() {
            warn!("Could not clear stored auth token: {}", e);
        }
        let mut state = self.lock();
        state.reset();
        state.last_registration_id = receipt.registration_id.clone();
    }

    /// Blank form, no token.
    pub fn reset(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!("Could not clear stored auth token: {}", e);
        }
        let mut state = self.lock();
        state.reset();
        state.last_registration_id = None;
    }

    /// Drop the token but keep what has been typed.
    pub fn logout(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!("Could not clear stored auth token: {}", e);
        }
        let mut state = self.lock();
        state.token = None;
        state.otp_dialog_open = false;
        state.otp_code.clear();
        state.phase = RegistrationPhase::Editing;
    }
}

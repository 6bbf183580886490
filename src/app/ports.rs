use crate::apis::{ApiEnvelope, ItemList, RegistrationReceipt, VerifyOtpData};
use crate::error::Result;
use async_trait::async_trait;
use seat_core::domain::{AppointmentSlot, AuthToken, City, DropdownOption, RegistrationPayload, SlotDate};

/// OTP and registration calls. `Err` means the round trip itself failed;
/// backend rejections come back as envelopes with `status == false`.
#[async_trait]
pub trait RegistrationApiPort: Send + Sync {
    async fn request_otp(&self, email: &str) -> Result<ApiEnvelope<bool>>;
    async fn verify_otp(&self, email: &str, otp: &str) -> Result<ApiEnvelope<VerifyOtpData>>;
    async fn register(
        &self,
        token: &AuthToken,
        payload: &RegistrationPayload,
    ) -> Result<ApiEnvelope<RegistrationReceipt>>;
}

// Dropdown data
#[async_trait]
pub trait CatalogApiPort: Send + Sync {
    async fn fetch_catalog(&self) -> Result<ApiEnvelope<ItemList<City>>>;
    async fn fetch_cities(&self) -> Result<ApiEnvelope<ItemList<DropdownOption>>>;
    async fn fetch_locations(&self, city_id: &str) -> Result<ApiEnvelope<ItemList<DropdownOption>>>;
    async fn fetch_slot_dates(
        &self,
        city_id: &str,
        location_id: &str,
    ) -> Result<ApiEnvelope<ItemList<SlotDate>>>;
    async fn fetch_slot_times(
        &self,
        city_id: &str,
        location_id: &str,
        date: &str,
    ) -> Result<ApiEnvelope<ItemList<AppointmentSlot>>>;
}

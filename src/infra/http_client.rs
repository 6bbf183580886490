use crate::apis::envelope::{OtpRequestBody, OtpVerifyBody};
use crate::apis::{ApiEnvelope, ItemList, RegistrationReceipt, VerifyOtpData};
use crate::app::ports::{CatalogApiPort, RegistrationApiPort};
use crate::config::{ApiConfig, EndpointConfig};
use crate::error::{RegistrarError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL};
use reqwest::{RequestBuilder, Url};
use seat_core::domain::{AppointmentSlot, AuthToken, City, DropdownOption, RegistrationPayload, SlotDate};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Decode a backend body. The backend reports failures in-band, so JSON is
/// read regardless of the HTTP status; a non-2xx status can never count as
/// success.
pub fn decode_envelope<T: DeserializeOwned>(http_status: u16, body: &[u8]) -> Result<ApiEnvelope<T>> {
    let success = (200..300).contains(&http_status);
    match serde_json::from_slice::<ApiEnvelope<Value>>(body) {
        Ok(mut raw) => {
            if !success && raw.status {
                warn!("HTTP {} carried a success envelope; treating as failure", http_status);
                raw.status = false;
            }
            if raw.status_code == 0 {
                raw.status_code = http_status;
            }
            Ok(raw.decode())
        }
        Err(_) if !success => Err(RegistrarError::Api {
            message: format!("HTTP {} with a non-JSON body", http_status),
        }),
        Err(e) => Err(e.into()),
    }
}

/// reqwest-backed client for every backend endpoint
pub struct ReqwestRegistrationApi {
    client: reqwest::Client,
    base_url: Url,
    endpoints: EndpointConfig,
}

impl ReqwestRegistrationApi {
    pub fn new(api: &ApiConfig, endpoints: &EndpointConfig) -> Result<Self> {
        let mut base = api.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| RegistrarError::Config(format!("invalid api.base_url '{}': {}", base, e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url,
            endpoints: endpoints.clone(),
        })
    }

    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RegistrarError::Config(format!("invalid endpoint path '{}': {}", path, e)))
    }

    fn get(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .get(self.endpoint_url(path)?)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-store"))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .post(self.endpoint_url(path)?)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-store"))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<ApiEnvelope<T>> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!("HTTP response: status={}, size={} bytes", status, body.len());
        decode_envelope(status, &body)
    }
}

#[async_trait]
impl RegistrationApiPort for ReqwestRegistrationApi {
    #[instrument(skip(self, email))]
    async fn request_otp(&self, email: &str) -> Result<ApiEnvelope<bool>> {
        let request = self.post(&self.endpoints.request_otp)?.json(&OtpRequestBody { email });
        Self::send(request).await
    }

    #[instrument(skip(self, email, otp))]
    async fn verify_otp(&self, email: &str, otp: &str) -> Result<ApiEnvelope<VerifyOtpData>> {
        let request = self
            .post(&self.endpoints.verify_otp)?
            .json(&OtpVerifyBody { email, otp });
        Self::send(request).await
    }

    #[instrument(skip(self, token, payload), fields(appointment_id = %payload.appointment_id))]
    async fn register(
        &self,
        token: &AuthToken,
        payload: &RegistrationPayload,
    ) -> Result<ApiEnvelope<RegistrationReceipt>> {
        let request = self
            .post(&self.endpoints.register)?
            .header(AUTHORIZATION, format!("Bearer {}", token.as_str()))
            .json(payload);
        Self::send(request).await
    }
}

#[async_trait]
impl CatalogApiPort for ReqwestRegistrationApi {
    #[instrument(skip(self))]
    async fn fetch_catalog(&self) -> Result<ApiEnvelope<ItemList<City>>> {
        Self::send(self.get(&self.endpoints.catalog)?).await
    }

    #[instrument(skip(self))]
    async fn fetch_cities(&self) -> Result<ApiEnvelope<ItemList<DropdownOption>>> {
        Self::send(self.get(&self.endpoints.cities)?).await
    }

    #[instrument(skip(self))]
    async fn fetch_locations(&self, city_id: &str) -> Result<ApiEnvelope<ItemList<DropdownOption>>> {
        let request = self.get(&self.endpoints.locations)?.query(&[("city_id", city_id)]);
        Self::send(request).await
    }

    #[instrument(skip(self))]
    async fn fetch_slot_dates(
        &self,
        city_id: &str,
        location_id: &str,
    ) -> Result<ApiEnvelope<ItemList<SlotDate>>> {
        let request = self
            .get(&self.endpoints.slot_dates)?
            .query(&[("cityId", city_id), ("locationId", location_id)]);
        Self::send(request).await
    }

    #[instrument(skip(self))]
    async fn fetch_slot_times(
        &self,
        city_id: &str,
        location_id: &str,
        date: &str,
    ) -> Result<ApiEnvelope<ItemList<AppointmentSlot>>> {
        let request = self.get(&self.endpoints.slot_times)?.query(&[
            ("city_id", city_id),
            ("location_id", location_id),
            ("date", date),
        ]);
        Self::send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ReqwestRegistrationApi {
        let api = ApiConfig {
            base_url: base_url.to_string(),
            timeout_seconds: 5,
        };
        ReqwestRegistrationApi::new(&api, &EndpointConfig::default()).unwrap()
    }

    #[test]
    fn joins_paths_with_or_without_trailing_slash() {
        for base in ["https://api.example.com/v1", "https://api.example.com/v1/"] {
            let api = client(base);
            assert_eq!(
                api.endpoint_url("students/request-otp").unwrap().as_str(),
                "https://api.example.com/v1/students/request-otp"
            );
            assert_eq!(
                api.endpoint_url("/registrations").unwrap().as_str(),
                "https://api.example.com/v1/registrations"
            );
        }
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let api = ApiConfig {
            base_url: "not a url".to_string(),
            timeout_seconds: 5,
        };
        assert!(matches!(
            ReqwestRegistrationApi::new(&api, &EndpointConfig::default()),
            Err(RegistrarError::Config(_))
        ));
    }

    #[test]
    fn decodes_rejection_sent_with_error_status() {
        let body = br#"{"status":false,"status_code":401,"message":"Invalid OTP","data":null}"#;
        let env: ApiEnvelope<VerifyOtpData> = decode_envelope(401, body).unwrap();
        assert!(!env.status);
        assert_eq!(env.message.as_deref(), Some("Invalid OTP"));
    }

    #[test]
    fn error_status_never_counts_as_success() {
        let body = br#"{"status":true,"data":"tok1"}"#;
        let env: ApiEnvelope<VerifyOtpData> = decode_envelope(500, body).unwrap();
        assert!(!env.status);
        assert_eq!(env.status_code, 500);
        assert_eq!(env.data, None);
    }

    #[test]
    fn non_json_error_body_becomes_api_error() {
        let result: Result<ApiEnvelope<bool>> = decode_envelope(502, b"<html>Bad Gateway</html>");
        match result {
            Err(RegistrarError::Api { message }) => assert!(message.contains("502")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn non_json_success_body_is_json_error() {
        let result: Result<ApiEnvelope<bool>> = decode_envelope(200, b"OK");
        assert!(matches!(result, Err(RegistrarError::Json(_))));
    }

    #[test]
    fn decodes_catalog_items() {
        let body = br#"{
            "status": true, "status_code": 200, "message": "ok",
            "data": { "items": [ { "id": 1, "name": "Mumbai", "locations": [] } ] }
        }"#;
        let env: ApiEnvelope<ItemList<City>> = decode_envelope(200, body).unwrap();
        let items = env.data.unwrap().items;
        assert_eq!(items[0].id, "1");
    }
}

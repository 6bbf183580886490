use seat_core::domain::deserialize_id;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Response wrapper shared by every backend endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: true,
            status_code: 200,
            message: None,
            data: Some(data),
        }
    }

    pub fn rejected(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status: false,
            status_code,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Backend message when it sent a non-empty one, `fallback` otherwise.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

impl ApiEnvelope<Value> {
    /// Type the payload. Failed envelopes drop whatever `data` they carried,
    /// since error bodies do not follow the success schema. A successful
    /// envelope stays successful even when its `data` has an unexpected shape.
    pub fn decode<T: DeserializeOwned>(self) -> ApiEnvelope<T> {
        let data = match (self.status, self.data) {
            (true, Some(Value::Null)) | (true, None) => None,
            (true, Some(value)) => match serde_json::from_value(value) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!("Ignoring unexpected response data: {}", e);
                    None
                }
            },
            (false, _) => None,
        };
        ApiEnvelope {
            status: self.status,
            status_code: self.status_code,
            message: self.message,
            data,
        }
    }
}

/// `{items: [...]}` payload used by the dropdown endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> ItemList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[derive(Debug, Serialize)]
pub struct OtpRequestBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub struct OtpVerifyBody<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

/// Verify-OTP payload: some deployments return the bare token, others wrap it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerifyOtpData {
    Token(String),
    Wrapped { token: String },
}

impl VerifyOtpData {
    pub fn token(&self) -> &str {
        match self {
            VerifyOtpData::Token(token) => token,
            VerifyOtpData::Wrapped { token } => token,
        }
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Id(#[serde(deserialize_with = "deserialize_id")] String);

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| id.0))
}

/// Registration data as sent: either the bare id or an object carrying it.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawReceipt {
    Id(#[serde(deserialize_with = "deserialize_id")] String),
    Object {
        #[serde(default, deserialize_with = "deserialize_optional_id")]
        registration_id: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl From<RawReceipt> for RegistrationReceipt {
    fn from(raw: RawReceipt) -> Self {
        match raw {
            RawReceipt::Id(id) => Self {
                registration_id: Some(id),
                extra: Map::new(),
            },
            RawReceipt::Object { registration_id, extra } => Self { registration_id, extra },
        }
    }
}

/// Successful registration response data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawReceipt")]
pub struct RegistrationReceipt {
    pub registration_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

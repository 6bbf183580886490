pub mod envelope;

pub use envelope::{ApiEnvelope, ItemList, RegistrationReceipt, VerifyOtpData};

/// Backend the registration form talks to unless configured otherwise
pub const DEFAULT_API_URL: &str = "https://api.reliancedigitalcommunity.com/";

/// Default on-disk location of the persisted auth token
pub const DEFAULT_TOKEN_PATH: &str = ".seat_registrar/storage.json";

// Environment overrides
pub const ENV_CONFIG_PATH: &str = "REGISTRAR_CONFIG";
pub const ENV_API_BASE_URL: &str = "REGISTRAR_API_BASE_URL";
pub const ENV_TOKEN_PATH: &str = "REGISTRAR_TOKEN_PATH";
pub const ENV_CATALOG_SOURCE: &str = "REGISTRAR_CATALOG_SOURCE";

// User-facing messages
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again";
pub const OTP_SEND_FAILED: &str = "Failed to send OTP";
pub const OTP_SEND_ERROR: &str = "Error sending OTP. Please try again.";
pub const OTP_VERIFY_ERROR: &str = "Error verifying OTP. Please try again.";
pub const OTP_REQUIRED: &str = "You need to enter an OTP";
pub const OTP_NOT_REQUESTED: &str = "Please request an OTP first.";
pub const OTP_INVALID: &str = "Invalid OTP";
pub const EMAIL_REQUIRED_FOR_OTP: &str = "Please enter an email address";
pub const VERIFY_EMAIL_FIRST: &str = "Please verify your email first before submitting.";

use crate::common::error::Result;
use crate::domain::AuthToken;

/// Well-known key the token is persisted under
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Persistence for the single auth token issued by OTP verification
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<AuthToken>>;
    fn save(&self, token: &AuthToken) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

pub mod file;
pub mod in_memory;
pub mod traits;

pub use file::FileTokenStore;
pub use in_memory::InMemoryTokenStore;
pub use traits::{TokenStore, AUTH_TOKEN_KEY};

pub mod cascade;
pub mod common;
pub mod dates;
pub mod domain;
pub mod storage;
pub mod validation;

pub use cascade::CatalogCascade;
pub use domain::*;

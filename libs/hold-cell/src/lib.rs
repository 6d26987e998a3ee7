pub mod error;
pub mod models;
pub mod services;

pub use error::HoldStoreError;
pub use models::*;
pub use services::*;

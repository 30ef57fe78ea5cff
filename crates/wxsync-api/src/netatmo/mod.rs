// Netatmo weather API: OAuth2 token endpoint and station data.

pub mod client;
pub mod models;

pub use models::{StationDataResponse, StationDevice, StationModule, TokenResponse};

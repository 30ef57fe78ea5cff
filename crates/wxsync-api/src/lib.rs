// wxsync-api: Async Rust clients for the Netatmo weather API and the UDM platform

pub mod error;
pub mod netatmo;
pub mod transport;
pub mod udm;

pub use error::Error;
pub use netatmo::client::{AppCredentials, NetatmoClient};
pub use transport::{TlsMode, TransportConfig};
pub use udm::client::UdmClient;

// lorasync-api: async clients for the LoRaWAN network server and the building platform

pub mod error;
pub mod listener;
pub mod network;
pub mod platform;
pub mod transport;

pub use error::Error;
pub use listener::{AssetListenerHandle, ReconnectPolicy};
pub use network::NetworkClient;
pub use platform::PlatformClient;
pub use transport::TransportConfig;

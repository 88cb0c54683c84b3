// Building-platform asset API client.
//
// Auth: X-API-Key header. Assets are upserted by device id; the asset
// listener WebSocket lives next door in `crate::listener`.

pub mod client;
pub mod types;

pub use client::PlatformClient;

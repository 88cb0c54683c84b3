// Network-server (LORIOT-style) REST client.
//
// Base path: /1/nwk/
// Auth: `Authorization: Bearer <token>` per tenant.

pub mod client;
pub mod types;

pub use client::NetworkClient;

// ── Domain model ──
//
// Canonical types the engine works with. Wire shapes live in
// `lorasync_api`; `crate::convert` translates between the two.

pub mod asset;
pub mod association;
pub mod request;
pub mod tenant;

pub use asset::{AssetChange, AssetEvent, PlatformAsset};
pub use association::Association;
pub use request::UpsertDeviceRequest;
pub use tenant::TenantConfig;

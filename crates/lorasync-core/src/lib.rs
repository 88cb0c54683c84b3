// lorasync-core: reconciliation engine between the building platform and
// a LoRaWAN network server.
//
// Flow: listener frames -> `run_event_loop` -> `TenantFanout` ->
// `Reconciler` -> {`locator`, `NetworkClient`} -> `AssociationRecorder`.
// Manual upserts enter at `TenantFanout::upsert_device`.

pub mod convert;
pub mod error;
pub mod eui;
pub mod event_loop;
pub mod fanout;
pub mod locator;
pub mod model;
pub mod notify;
pub mod reconcile;
pub mod recorder;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use eui::is_valid_eui;
pub use event_loop::run_event_loop;
pub use fanout::TenantFanout;
pub use reconcile::{AssetSettings, Outcome, Reconciler, SkipReason, TenantReport};
pub use recorder::AssociationRecorder;
pub use store::{
    AssociationStore, ConfigStore, JsonFileAssociationStore, MemoryAssociationStore,
    MemoryConfigStore, StoreError,
};

pub use model::{
    AssetChange, AssetEvent, Association, PlatformAsset, TenantConfig, UpsertDeviceRequest,
};

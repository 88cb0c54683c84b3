// ── Device locator ──
//
// The network server has no global device index, so a device is found
// by scanning every app of the tenant in listing order.

use lorasync_api::NetworkClient;
use lorasync_api::network::types::Device;
use tracing::debug;

/// Find the device with `dev_eui` in any app of the tenant.
///
/// Returns the first match in `list_apps` order. `Ok(None)` means every
/// app answered "not found"; any other per-app failure aborts the scan.
pub async fn find_device(
    client: &NetworkClient,
    dev_eui: &str,
) -> Result<Option<Device>, lorasync_api::Error> {
    let apps = client.list_apps().await?;
    debug!(dev_eui, apps = apps.len(), "searching apps for device");

    for app in &apps {
        if let Some(device) = client.get_device(&app.app_hex_id, dev_eui).await? {
            debug!(dev_eui, app_id = %app.app_hex_id, "device located");
            return Ok(Some(device));
        }
    }
    Ok(None)
}

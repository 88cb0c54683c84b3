// ── User notifications ──
//
// Bilingual messages telling a tenant's owning user what the engine did.

use lorasync_api::platform::types::{Notification, Translation};

use crate::model::AssetChange;

pub fn change_message(change: AssetChange, dev_eui: &str, asset_id: i32) -> Translation {
    let (de, en) = match change {
        AssetChange::Created => ("angelegt", "created"),
        AssetChange::Updated => ("geändert", "updated"),
        AssetChange::Deleted => ("gelöscht", "deleted"),
    };
    Translation {
        de: Some(format!(
            "Die App hat Gerät '{dev_eui}' und Asset '{asset_id}' {de}."
        )),
        en: Some(format!(
            "The app {en} device '{dev_eui}' and asset '{asset_id}'."
        )),
    }
}

pub fn change_notification(
    user_id: &str,
    project_id: &str,
    change: AssetChange,
    dev_eui: &str,
    asset_id: i32,
) -> Notification {
    Notification {
        user: user_id.to_owned(),
        project_id: Some(project_id.to_owned()),
        message: change_message(change, dev_eui, asset_id),
    }
}

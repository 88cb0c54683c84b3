// ── Tenant configuration ──

use std::collections::BTreeSet;
use std::time::Duration;

use secrecy::SecretString;

use lorasync_api::{NetworkClient, TransportConfig};

/// One connected network-server account plus its platform project bindings.
///
/// `enabled` is operator intent; `active` records that the engine has
/// started processing this configuration. They are independent: the
/// engine flips `active` to follow `enabled`, once per transition.
#[derive(Debug, Clone)]
pub struct TenantConfig {
    pub id: i64,
    pub enabled: bool,
    pub active: bool,
    pub api_base_url: String,
    pub api_token: SecretString,
    pub request_timeout: Duration,
    pub refresh_interval: Duration,
    /// Platform user who receives change notifications.
    pub user_id: String,
    pub project_ids: BTreeSet<String>,
}

impl TenantConfig {
    /// Whether an event for `project_id` belongs to this tenant.
    pub fn applies_to(&self, project_id: &str) -> bool {
        self.enabled && self.project_ids.contains(project_id)
    }

    /// Build a network client honouring this tenant's URL, token and timeout.
    pub fn network_client(&self) -> Result<NetworkClient, lorasync_api::Error> {
        NetworkClient::new(
            &self.api_base_url,
            &self.api_token,
            &TransportConfig::with_timeout(self.request_timeout),
        )
    }
}

//! Settings-redirect prompt for permanently denied capabilities

use async_trait::async_trait;

use super::Capability;

/// What the user chose in the settings-redirect prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationChoice {
    OpenSettings,
    Cancel,
}

/// UI collaborator that guides the user to the system settings screen
///
/// The orchestrator treats the prompt as fire-and-forget: its outcome never
/// gates the success or denial callbacks.
#[async_trait]
pub trait SettingsPrompt: Send + Sync {
    /// Show the prompt for `permanently_denied` and resolve when it is closed
    async fn prompt_open_settings(&self, permanently_denied: &[Capability]) -> RemediationChoice;

    /// Open the host application's system settings screen
    fn open_app_settings(&self);
}

/// Prompt body listing the affected capabilities, one per line
pub fn describe_capabilities(capabilities: &[Capability]) -> String {
    let mut labels: Vec<&str> = capabilities.iter().map(Capability::display_name).collect();
    labels.dedup();

    format!(
        "Some permissions required for full functionality are permanently denied. \
         Please open App Settings and allow them.\n- {}\n",
        labels.join("\n- ")
    )
}

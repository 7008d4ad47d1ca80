// # Intent Service Trait
//
// Access to submitted intents and their installed realizations.

use async_trait::async_trait;

use crate::model::{InstallableIntent, Intent, IntentId};

/// Intent queries
#[async_trait]
pub trait IntentService: Send + Sync {
    /// Look up a submitted intent
    ///
    /// - `Ok(Some(Intent))`: the intent
    /// - `Ok(None)`: no such intent
    async fn intent(&self, intent_id: &IntentId) -> Result<Option<Intent>, crate::Error>;

    /// Installed realizations of the intent
    ///
    /// An empty list means the intent is not (yet) installed.
    async fn installable_intents(
        &self,
        intent_id: &IntentId,
    ) -> Result<Vec<InstallableIntent>, crate::Error>;
}

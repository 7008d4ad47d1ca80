// # Statistic Service Trait

use async_trait::async_trait;

use crate::model::{Link, Load};

/// Link load queries
#[async_trait]
pub trait StatisticService: Send + Sync {
    /// Latest load sample for the link
    ///
    /// `Ok(None)` means no sample has been collected for the link.
    async fn load(&self, link: &Link) -> Result<Option<Load>, crate::Error>;
}

use super::client::MarketClient;
use super::{IndexSnapshot, MarketIndex, Range};
use crate::upstream::Transport;
use tracing::warn;

/// Per-index outcome of a batch fetch; `None` when the index failed and no
/// cached data could stand in.
pub type IndexBoard = Vec<(MarketIndex, Option<IndexSnapshot>)>;

impl<T: Transport> MarketClient<T> {
    /// Fetches `indices` concurrently. Output order follows `indices`.
    pub async fn fetch_many(&self, indices: &[MarketIndex], range: Range) -> IndexBoard {
        self.fan_out(indices.iter().copied(), |index| async move {
            match self.fetch_index(index, range).await {
                Ok(snapshot) => (index, Some(snapshot)),
                Err(e) => {
                    warn!(index = index.name(), %range, "index unavailable: {e}");
                    (index, None)
                }
            }
        })
        .await
    }

    pub async fn fetch_all_market_indices(&self, range: Range) -> IndexBoard {
        self.fetch_many(&MarketIndex::ALL, range).await
    }
}

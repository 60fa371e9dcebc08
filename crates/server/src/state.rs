use std::sync::Arc;

use gpuwatch_core::{AdviceEngine, PriceBoard};
use gpuwatch_feed::{load_board, PriceSource};
use tokio::sync::RwLock;

/// Shared handler state. The board snapshot is replaced wholesale on
/// refresh; readers always see a complete, internally consistent board.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn PriceSource>,
    pub engine: AdviceEngine,
    board: Arc<RwLock<PriceBoard>>,
}

impl AppState {
    pub fn new(source: Arc<dyn PriceSource>, initial: PriceBoard) -> Self {
        Self {
            source,
            engine: AdviceEngine::default(),
            board: Arc::new(RwLock::new(initial)),
        }
    }

    /// Clone of the current board snapshot.
    pub async fn snapshot(&self) -> PriceBoard {
        self.board.read().await.clone()
    }

    /// Reload from the upstream feed and swap the snapshot in one step.
    /// Feed failures surface as a fallback board, never as an error.
    pub async fn refresh(&self) -> PriceBoard {
        let fresh = load_board(self.source.as_ref()).await;
        *self.board.write().await = fresh.clone();
        fresh
    }
}

// 排他ロックで保護された結果コレクション

use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// 並行ワーカーの結果を蓄積する順序付きコレクション
///
/// `append` は排他ロックを取得して1件追加するだけで、ロックを長く保持しない。
/// 読み取り（`snapshot` / `take_all`）はバリア解除後にコーディネーターだけが行う前提。
/// 追加順はロック獲得順であり、ワーカー間の順序は保証されない。
#[derive(Debug)]
pub struct ResultStore<R> {
    records: Arc<AsyncMutex<Vec<R>>>,
}

impl<R> Clone for ResultStore<R> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<R> Default for ResultStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ResultStore<R> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::new(AsyncMutex::new(Vec::with_capacity(capacity))),
        }
    }

    /// 排他ロック下で1件追加
    pub async fn append(&self, record: R) {
        self.records.lock().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// 蓄積済みの結果をすべて取り出し、ストアを空にする
    pub async fn take_all(&self) -> Vec<R> {
        std::mem::take(&mut *self.records.lock().await)
    }
}

impl<R: Clone> ResultStore<R> {
    /// 現在の内容のコピーを取得
    pub async fn snapshot(&self) -> Vec<R> {
        self.records.lock().await.clone()
    }
}

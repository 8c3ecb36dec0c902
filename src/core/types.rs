// 並行処理に関連するデータ型定義

use super::error::{ConcurrencyError, ConcurrencyResult};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// 1単位の作業を識別するID
///
/// ディスパッチャが `[0, n)` の範囲で生成し、ちょうど1つの並行実行に渡される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Task {
    pub id: usize,
}

impl Task {
    pub const fn new(id: usize) -> Self {
        Self { id }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {}", self.id)
    }
}

/// 失敗した作業単位の記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub task: Task,
    pub reason: String,
}

/// チャンネルの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChannelState {
    /// 送受信可能
    Open,
    /// クローズ済みだがバッファに値が残っている
    ClosedDraining,
    /// クローズ済みかつ空。受信はストリーム終端を返す
    ClosedExhausted,
}

impl ChannelState {
    pub const fn is_closed(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// バッチ処理全体の結果
///
/// バリア解除後にのみ作られるため、中身は全ワーカー終了後のスナップショット。
#[derive(Debug, Clone)]
pub struct BatchReport<R> {
    /// 成功したワーカーの結果（完了順、順序は保証されない）
    pub records: Vec<R>,
    pub failures: Vec<TaskFailure>,
    pub dispatched: usize,
    pub elapsed: Duration,
}

impl<R> BatchReport<R> {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// 集計用のサマリー
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            dispatched: self.dispatched,
            succeeded: self.records.len(),
            failed: self.failures.len(),
            elapsed_ms: self.elapsed.as_millis() as u64,
        }
    }

    /// 失敗を1つのエラーに集約して返す
    pub fn into_result(self) -> ConcurrencyResult<Vec<R>> {
        if self.failures.is_empty() {
            return Ok(self.records);
        }

        let details = self
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.task, failure.reason))
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConcurrencyError::worker_failures(
            self.failures.len(),
            self.dispatched,
            details,
        ))
    }
}

/// バッチ結果のサマリー（JSON出力用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

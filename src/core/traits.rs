// 並行処理システムのトレイト定義
// 全ての抽象化インターフェースを定義

use super::types::Task;
use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use std::time::Duration;

/// デモ実行の設定を抽象化するトレイト
#[automock]
pub trait DemoConfig: Send + Sync {
    /// 1バッチでディスパッチする作業単位の数
    fn batch_size(&self) -> usize;

    /// ランダム遅延の上限（この値未満）
    fn max_latency(&self) -> Duration;

    /// 結果を記録するワーカーの固定遅延
    fn fixed_latency(&self) -> Duration;

    /// ストリームチャンネルの容量（0 = 同期ハンドオフ）
    fn channel_capacity(&self) -> usize;

    /// プロデューサーが送信する値の数
    fn stream_length(&self) -> usize;

    /// コンシューマーが1値ごとに費やす処理時間
    fn consumer_delay(&self) -> Duration;

    /// 進捗報告を有効にするかどうか
    fn enable_progress_reporting(&self) -> bool;
}

// DemoConfig for Box<dyn DemoConfig>
impl DemoConfig for Box<dyn DemoConfig> {
    fn batch_size(&self) -> usize {
        self.as_ref().batch_size()
    }

    fn max_latency(&self) -> Duration {
        self.as_ref().max_latency()
    }

    fn fixed_latency(&self) -> Duration {
        self.as_ref().fixed_latency()
    }

    fn channel_capacity(&self) -> usize {
        self.as_ref().channel_capacity()
    }

    fn stream_length(&self) -> usize {
        self.as_ref().stream_length()
    }

    fn consumer_delay(&self) -> Duration {
        self.as_ref().consumer_delay()
    }

    fn enable_progress_reporting(&self) -> bool {
        self.as_ref().enable_progress_reporting()
    }
}

/// 進捗報告の抽象化トレイト
#[automock]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// バッチ開始時の報告
    async fn report_started(&self, label: &str, total: usize);

    /// 進捗更新の報告
    async fn report_progress(&self, completed: usize, total: usize);

    /// 作業単位の失敗報告
    async fn report_error(&self, task: Task, error: &str);

    /// バッチ完了時の報告
    async fn report_completed(
        &self,
        label: &str,
        succeeded: usize,
        failed: usize,
        elapsed: Duration,
    );
}

// ProgressReporter for Box<dyn ProgressReporter>
#[async_trait]
impl ProgressReporter for Box<dyn ProgressReporter> {
    async fn report_started(&self, label: &str, total: usize) {
        self.as_ref().report_started(label, total).await
    }

    async fn report_progress(&self, completed: usize, total: usize) {
        self.as_ref().report_progress(completed, total).await
    }

    async fn report_error(&self, task: Task, error: &str) {
        self.as_ref().report_error(task, error).await
    }

    async fn report_completed(
        &self,
        label: &str,
        succeeded: usize,
        failed: usize,
        elapsed: Duration,
    ) {
        self.as_ref()
            .report_completed(label, succeeded, failed, elapsed)
            .await
    }
}

/// 1単位の作業を表すトレイト
///
/// ディスパッチャはタスクIDごとに `run` を並行に呼び出す。実装は共有可変状態を持たないこと。
#[automock(type Output = String;)]
#[async_trait]
pub trait Workload: Send + Sync {
    type Output: Send + 'static;

    /// 作業を実行して結果を返す
    async fn run(&self, task: Task) -> Result<Self::Output>;
}

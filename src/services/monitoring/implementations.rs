// 進捗監視の具象実装

use crate::core::{ProgressReporter, Task};
use async_trait::async_trait;
use std::time::Duration;

/// コンソール出力による進捗報告実装
#[derive(Debug, Default, Clone)]
pub struct ConsoleProgressReporter {
    quiet: bool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

#[async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn report_started(&self, label: &str, total: usize) {
        if !self.quiet {
            println!("🚀 [{label}] Dispatching {total} tasks...");
        }
    }

    async fn report_progress(&self, completed: usize, total: usize) {
        if !self.quiet && total > 0 {
            let percentage = (completed as f64 / total as f64) * 100.0;
            println!("📊 Progress: {completed}/{total} ({percentage:.1}%)");
        }
    }

    async fn report_error(&self, task: Task, error: &str) {
        if !self.quiet {
            eprintln!("❌ {task} failed: {error}");
        }
    }

    async fn report_completed(
        &self,
        label: &str,
        succeeded: usize,
        failed: usize,
        elapsed: Duration,
    ) {
        if !self.quiet {
            println!(
                "✅ [{label}] Completed! Succeeded: {succeeded}, Failed: {failed} ({:.3}s)",
                elapsed.as_secs_f64()
            );
        }
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_started(&self, _label: &str, _total: usize) {
        // 何もしない
    }

    async fn report_progress(&self, _completed: usize, _total: usize) {
        // 何もしない
    }

    async fn report_error(&self, _task: Task, _error: &str) {
        // 何もしない
    }

    async fn report_completed(
        &self,
        _label: &str,
        _succeeded: usize,
        _failed: usize,
        _elapsed: Duration,
    ) {
        // 何もしない
    }
}

// Worker - 模擬問い合わせの実装

use crate::core::{Task, Workload};
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// `[0, max)` の範囲でランダムな遅延を選ぶ
fn random_latency(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_ms))
}

/// ランダムな遅延だけを消費する問い合わせ
///
/// 結果としてタスクIDと実際に待機した時間を返す。
#[derive(Debug, Clone)]
pub struct SimulatedQuery {
    max_latency: Duration,
}

impl SimulatedQuery {
    pub fn new(max_latency: Duration) -> Self {
        Self { max_latency }
    }
}

#[async_trait]
impl Workload for SimulatedQuery {
    type Output = (Task, Duration);

    async fn run(&self, task: Task) -> Result<(Task, Duration)> {
        let latency = random_latency(self.max_latency);
        tokio::time::sleep(latency).await;
        debug!(task = task.id, latency_ms = latency.as_millis() as u64, "query finished");
        Ok((task, latency))
    }
}

/// 固定遅延の後、データセットから `task.id` 番目のレコードを返す問い合わせ
#[derive(Debug, Clone)]
pub struct RecordingQuery {
    dataset: Arc<Vec<String>>,
    latency: Duration,
}

impl RecordingQuery {
    pub fn new<I, S>(dataset: I, latency: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dataset: Arc::new(dataset.into_iter().map(Into::into).collect()),
            latency,
        }
    }

    pub fn dataset(&self) -> &[String] {
        &self.dataset
    }
}

#[async_trait]
impl Workload for RecordingQuery {
    type Output = String;

    async fn run(&self, task: Task) -> Result<String> {
        tokio::time::sleep(self.latency).await;

        let Some(record) = self.dataset.get(task.id) else {
            anyhow::bail!(
                "no record for {task} (dataset has {} entries)",
                self.dataset.len()
            );
        };
        debug!(task = task.id, record = %record, "query returned record");
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_random_latency_bounds() {
        assert_eq!(random_latency(Duration::ZERO), Duration::ZERO);

        for _ in 0..100 {
            assert!(random_latency(Duration::from_millis(10)) < Duration::from_millis(10));
        }
    }

    #[tokio::test]
    async fn test_simulated_query_respects_max_latency() {
        let query = SimulatedQuery::new(Duration::from_millis(20));
        let (task, latency) = query.run(Task::new(4)).await.unwrap();
        assert_eq!(task, Task::new(4));
        assert!(latency < Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_recording_query_returns_record() {
        let query = RecordingQuery::new(["id1", "id2"], Duration::from_millis(5));
        let start = Instant::now();

        assert_eq!(query.run(Task::new(1)).await.unwrap(), "id2");
        assert!(start.elapsed() >= Duration::from_millis(5));
        assert_eq!(query.dataset().len(), 2);
    }

    #[tokio::test]
    async fn test_recording_query_out_of_range() {
        let query = RecordingQuery::new(["id1"], Duration::ZERO);
        let error = query.run(Task::new(3)).await.unwrap_err();
        assert!(error.to_string().contains("no record for task 3"));
    }
}

// 設定管理の具象実装

use crate::core::DemoConfig;
use std::time::Duration;

/// 結果を記録するワーカーが参照する既定のデータセット
pub const DEFAULT_DATASET: [&str; 5] = ["id1", "id2", "id3", "id4", "id5"];

/// デフォルト設定実装
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultDemoConfig {
    batch_size: usize,
    max_latency: Duration,
    fixed_latency: Duration,
    channel_capacity: usize,
    stream_length: usize,
    consumer_delay: Duration,
    enable_progress: bool,
}

impl DefaultDemoConfig {
    /// ミリ秒単位の遅延で動く設定（テスト・`--fast` 用）
    pub fn fast() -> Self {
        Self::default()
            .with_max_latency(Duration::from_millis(20))
            .with_fixed_latency(Duration::from_millis(10))
            .with_consumer_delay(Duration::from_millis(5))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_latency(mut self, max_latency: Duration) -> Self {
        self.max_latency = max_latency;
        self
    }

    pub fn with_fixed_latency(mut self, fixed_latency: Duration) -> Self {
        self.fixed_latency = fixed_latency;
        self
    }

    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    pub fn with_stream_length(mut self, stream_length: usize) -> Self {
        self.stream_length = stream_length;
        self
    }

    pub fn with_consumer_delay(mut self, consumer_delay: Duration) -> Self {
        self.consumer_delay = consumer_delay;
        self
    }

    pub fn with_progress_reporting(mut self, enable: bool) -> Self {
        self.enable_progress = enable;
        self
    }
}

impl Default for DefaultDemoConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_DATASET.len(),
            max_latency: Duration::from_millis(2000),
            fixed_latency: Duration::from_millis(2000),
            channel_capacity: 5,
            stream_length: 5,
            consumer_delay: Duration::from_secs(1),
            enable_progress: true,
        }
    }
}

impl DemoConfig for DefaultDemoConfig {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn max_latency(&self) -> Duration {
        self.max_latency
    }

    fn fixed_latency(&self) -> Duration {
        self.fixed_latency
    }

    fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    fn stream_length(&self) -> usize {
        self.stream_length
    }

    fn consumer_delay(&self) -> Duration {
        self.consumer_delay
    }

    fn enable_progress_reporting(&self) -> bool {
        self.enable_progress
    }
}

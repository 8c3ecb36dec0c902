// DemoEngine - 設定と進捗報告を注入した並行処理デモのオーケストレーター

use super::{
    consumer::{spawn_consumer, ConsumedStream},
    dispatcher::TaskDispatcher,
    producer::{spawn_handoff, spawn_producer},
};
use crate::{
    core::{BatchReport, ConcurrencyError, ConcurrencyResult, DemoConfig, ProgressReporter, Task},
    services::{RecordingQuery, SimulatedQuery, StreamChannel},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// 同期ハンドオフ1回分の結果
#[derive(Debug, Clone, PartialEq)]
pub struct HandoffOutcome<T> {
    pub value: T,
    pub elapsed: Duration,
}

/// プロデューサー/コンシューマー1回分の結果
#[derive(Debug, Clone)]
pub struct StreamOutcome<T> {
    pub capacity: usize,
    pub sent: usize,
    pub consumed: ConsumedStream<T>,
    /// プロデューサーが送信を終えてクローズするまでの時間
    pub producer_elapsed: Duration,
    /// コンシューマーが終端を観測するまでの時間
    pub total_elapsed: Duration,
}

impl<T> StreamOutcome<T> {
    /// バッファによってプロデューサーがコンシューマーより先に終わったか
    pub fn producer_finished_first(&self) -> bool {
        self.producer_elapsed < self.total_elapsed
    }
}

/// 依存性注入による並行処理デモエンジン
///
/// 設定と進捗報告はコンストラクタで注入され、ディスパッチャ間で Arc 共有される。
pub struct DemoEngine<C, R> {
    config: Arc<C>,
    reporter: Arc<R>,
}

impl<C, R> DemoEngine<C, R>
where
    C: DemoConfig,
    R: ProgressReporter + 'static,
{
    pub fn new(config: C, reporter: R) -> Self {
        Self {
            config: Arc::new(config),
            reporter: Arc::new(reporter),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    fn dispatcher<T: Send + 'static>(&self, label: &str) -> TaskDispatcher<T, R> {
        TaskDispatcher::with_reporter(label, Arc::clone(&self.reporter))
    }

    /// ランダム遅延の問い合わせを並行に実行し、バリアで全完了を待つ
    pub async fn fan_out(&self) -> BatchReport<(Task, Duration)> {
        let mut dispatcher = self.dispatcher("fan-out");
        let workload = Arc::new(SimulatedQuery::new(self.config.max_latency()));
        dispatcher
            .dispatch_workload(self.config.batch_size(), workload)
            .await;
        dispatcher.wait().await
    }

    /// データセットのレコードを並行に取得し、結果ストアへ集約する
    pub async fn collect(&self, dataset: &[String]) -> ConcurrencyResult<BatchReport<String>> {
        let batch_size = self.config.batch_size();
        if batch_size > dataset.len() {
            return Err(ConcurrencyError::configuration(format!(
                "batch size {batch_size} exceeds dataset length {}",
                dataset.len()
            )));
        }

        let mut dispatcher = self.dispatcher("collect");
        let workload = Arc::new(RecordingQuery::new(
            dataset.iter().cloned(),
            self.config.fixed_latency(),
        ));
        dispatcher.dispatch_workload(batch_size, workload).await;
        Ok(dispatcher.wait().await)
    }

    /// 容量0のチャンネルで値を1つ受け渡す
    pub async fn handoff<T>(&self, value: T) -> ConcurrencyResult<HandoffOutcome<T>>
    where
        T: Send + 'static,
    {
        let start = Instant::now();
        let channel = StreamChannel::rendezvous();
        let sender = spawn_handoff(channel.clone(), value);

        // 送信側は受け取りまで戻らないため、受信が成立すれば必ず完了する
        let received = channel.receive().await;
        sender.await??;

        // チャンネルはこの関数の外に出ずクローズもされないので、送信成功なら受信も成立している
        let Some(value) = received else {
            unreachable!("rendezvous handoff succeeded without a receiver");
        };
        let elapsed = start.elapsed();
        info!(elapsed_ms = elapsed.as_millis() as u64, "handoff completed");
        Ok(HandoffOutcome { value, elapsed })
    }

    /// `0..stream_length` を送信するプロデューサーと、終端まで読むコンシューマーを走らせる
    ///
    /// `on_value` はコンシューマー側で到着順に呼ばれる。
    pub async fn stream<F>(&self, on_value: F) -> ConcurrencyResult<StreamOutcome<u64>>
    where
        F: FnMut(&u64) + Send + 'static,
    {
        self.stream_with_capacity(self.config.channel_capacity(), on_value)
            .await
    }

    /// 容量を明示してストリームを走らせる
    pub async fn stream_with_capacity<F>(
        &self,
        capacity: usize,
        on_value: F,
    ) -> ConcurrencyResult<StreamOutcome<u64>>
    where
        F: FnMut(&u64) + Send + 'static,
    {
        let start = Instant::now();
        let channel = StreamChannel::new(capacity);
        let values: Vec<u64> = (0..self.config.stream_length() as u64).collect();

        let producer = spawn_producer(channel.clone(), values, Duration::ZERO);
        let consumer = spawn_consumer(channel, self.config.consumer_delay(), on_value);

        let sent = producer.await??;
        let producer_elapsed = start.elapsed();
        let consumed = consumer.await?;
        let total_elapsed = start.elapsed();

        info!(
            capacity,
            sent,
            received = consumed.values.len(),
            producer_ms = producer_elapsed.as_millis() as u64,
            total_ms = total_elapsed.as_millis() as u64,
            "stream drained"
        );

        Ok(StreamOutcome {
            capacity,
            sent,
            consumed,
            producer_elapsed,
            total_elapsed,
        })
    }
}

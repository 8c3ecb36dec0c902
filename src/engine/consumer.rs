// Consumer - チャンネルを終端まで読み切る

use crate::{
    core::ConcurrencyResult,
    services::StreamChannel,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 読み切ったストリームの記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedStream<T> {
    /// 到着順の値
    pub values: Vec<T>,
    /// 観測したストリーム終端の回数（ループはここで止まるため常に1）
    pub end_of_stream_signals: usize,
}

impl<T> Default for ConsumedStream<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            end_of_stream_signals: 0,
        }
    }
}

/// ストリーム終端まで受信して値を集める
pub async fn drain<T>(channel: &StreamChannel<T>) -> ConsumedStream<T> {
    let mut consumed = ConsumedStream::default();
    while let Some(value) = channel.receive().await {
        consumed.values.push(value);
    }
    consumed.end_of_stream_signals += 1;
    consumed
}

/// キャンセル可能な読み切り
pub async fn drain_cancellable<T>(
    channel: &StreamChannel<T>,
    token: &CancellationToken,
) -> ConcurrencyResult<ConsumedStream<T>> {
    let mut consumed = ConsumedStream::default();
    while let Some(value) = channel.receive_cancellable(token).await? {
        consumed.values.push(value);
    }
    consumed.end_of_stream_signals += 1;
    Ok(consumed)
}

/// Consumer: 値ごとに `on_value` を呼び、`pacing` だけ処理時間を模擬する
pub fn spawn_consumer<T, F>(
    channel: StreamChannel<T>,
    pacing: Duration,
    mut on_value: F,
) -> JoinHandle<ConsumedStream<T>>
where
    T: Send + 'static,
    F: FnMut(&T) + Send + 'static,
{
    tokio::spawn(async move {
        let mut consumed = ConsumedStream::default();
        while let Some(value) = channel.receive().await {
            on_value(&value);
            debug!(received = consumed.values.len() + 1, "value consumed");
            consumed.values.push(value);
            if !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
        }
        consumed.end_of_stream_signals += 1;
        consumed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConcurrencyError;
    use crate::engine::producer::spawn_producer;
    use std::sync::{Arc, Mutex};
    use tokio::time::timeout;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_drain_preserves_order() {
        for capacity in [0, 1, 3, 10] {
            let channel = StreamChannel::new(capacity);
            let producer = spawn_producer(channel.clone(), (0..20).collect(), Duration::ZERO);

            let consumed = timeout(Duration::from_secs(5), drain(&channel)).await.unwrap();
            assert_eq!(consumed.values, (0..20).collect::<Vec<_>>(), "capacity {capacity}");
            assert_eq!(consumed.end_of_stream_signals, 1);
            assert_eq!(producer.await.unwrap().unwrap(), 20);
        }
    }

    #[tokio::test]
    async fn test_spawn_consumer_invokes_callback() {
        let channel = StreamChannel::new(2);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let consumer = {
            let seen = Arc::clone(&seen);
            spawn_consumer(channel.clone(), Duration::from_millis(1), move |value: &u32| {
                seen.lock().unwrap().push(*value);
            })
        };
        spawn_producer(channel, vec![5, 6, 7], Duration::ZERO)
            .await
            .unwrap()
            .unwrap();

        let consumed = timeout(Duration::from_secs(5), consumer).await.unwrap().unwrap();
        assert_eq!(consumed.values, vec![5, 6, 7]);
        assert_eq!(*seen.lock().unwrap(), vec![5, 6, 7]);
    }

    #[tokio::test]
    async fn test_drain_cancellable() {
        let channel = StreamChannel::<u32>::new(1);
        let token = CancellationToken::new();
        token.cancel();

        let error = drain_cancellable(&channel, &token).await.unwrap_err();
        assert!(matches!(error, ConcurrencyError::Cancelled { .. }));

        channel.send(1).await.unwrap();
        channel.close().unwrap();
        let consumed = drain_cancellable(&channel, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(consumed.values, vec![1]);
    }
}

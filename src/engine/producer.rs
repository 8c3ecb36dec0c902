// Producer - 有限の値列をチャンネルへ配信する

use crate::{core::ConcurrencyResult, services::StreamChannel};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// 任意の送信ループをクローズガード付きで起動する
///
/// `send_loop` が正常終了・エラー・パニックのどれで抜けても、チャンネルは必ずクローズされる。
/// 戻り値は送信した値の数。
pub fn produce_with<T, F, Fut>(
    channel: StreamChannel<T>,
    send_loop: F,
) -> JoinHandle<ConcurrencyResult<usize>>
where
    T: Send + 'static,
    F: FnOnce(StreamChannel<T>) -> Fut + Send + 'static,
    Fut: Future<Output = ConcurrencyResult<usize>> + Send + 'static,
{
    tokio::spawn(async move {
        let _close = channel.close_guard();
        send_loop(channel.clone()).await
    })
}

/// Producer: `values` を順に送信し、最後に必ずチャンネルをクローズする
///
/// `pacing` が0でなければ各送信の前に待機する。
pub fn spawn_producer<T>(
    channel: StreamChannel<T>,
    values: Vec<T>,
    pacing: Duration,
) -> JoinHandle<ConcurrencyResult<usize>>
where
    T: Send + 'static,
{
    produce_with(channel, move |channel| async move {
        let mut sent = 0;
        for value in values {
            if !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
            channel.send(value).await?;
            sent += 1;
            debug!(sent, "value sent");
        }
        info!(sent, capacity = channel.capacity(), "producer finished sending");
        ConcurrencyResult::Ok(sent)
    })
}

/// 単一の値を送信するだけのタスク（クローズしない）
///
/// クローズ済みチャンネルへの送信は `SendOnClosed` としてハンドル経由で返るため、
/// 呼び出し側は必ず結果を確認すること。
#[must_use = "a send on a closed channel is only reported through the join handle"]
pub fn spawn_handoff<T>(channel: StreamChannel<T>, value: T) -> JoinHandle<ConcurrencyResult<()>>
where
    T: Send + 'static,
{
    tokio::spawn(async move { channel.send(value).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChannelState, ConcurrencyError};
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_producer_sends_all_values_then_closes() {
        let channel = StreamChannel::new(10);
        let producer = spawn_producer(channel.clone(), vec![1, 2, 3], Duration::ZERO);

        assert_eq!(producer.await.unwrap().unwrap(), 3);
        assert_eq!(channel.state(), ChannelState::ClosedDraining);

        let mut received = Vec::new();
        while let Some(value) = channel.receive().await {
            received.push(value);
        }
        assert_eq!(received, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_producer_empty_values() {
        let channel = StreamChannel::<u32>::new(1);
        let producer = spawn_producer(channel.clone(), vec![], Duration::ZERO);

        assert_eq!(producer.await.unwrap().unwrap(), 0);
        let received = timeout(Duration::from_millis(100), channel.receive())
            .await
            .unwrap();
        assert_eq!(received, None);
    }

    #[tokio::test]
    async fn test_producer_closed_early_by_someone_else() {
        let channel = StreamChannel::new(1);
        channel.close().unwrap();

        let producer = spawn_producer(channel.clone(), vec![1, 2], Duration::ZERO);
        let error = producer.await.unwrap().unwrap_err();
        assert!(matches!(error, ConcurrencyError::SendOnClosed));
    }

    #[tokio::test]
    async fn test_produce_with_closes_after_error() {
        let channel = StreamChannel::new(4);
        let producer = produce_with(channel.clone(), |channel| async move {
            channel.send(1).await?;
            Err::<usize, _>(ConcurrencyError::cancelled("interrupted send loop"))
        });

        assert!(producer.await.unwrap().is_err());
        assert_eq!(channel.receive().await, Some(1));
        assert_eq!(channel.receive().await, None);
    }

    #[tokio::test]
    async fn test_produce_with_closes_after_panic() {
        let channel = StreamChannel::<u32>::new(4);
        fn crash() -> ConcurrencyResult<usize> {
            panic!("send loop crashed");
        }

        let producer = produce_with(channel.clone(), |_channel| async move { crash() });

        assert!(producer.await.unwrap_err().is_panic());
        let received = timeout(Duration::from_millis(100), channel.receive())
            .await
            .expect("パニック後もコンシューマーは終端を受け取るべきです");
        assert_eq!(received, None);
    }

    #[tokio::test]
    async fn test_handoff_on_closed_channel_reports_error() {
        let channel = StreamChannel::<i64>::rendezvous();
        channel.close().unwrap();

        let error = spawn_handoff(channel.clone(), 42).await.unwrap().unwrap_err();
        assert!(matches!(error, ConcurrencyError::SendOnClosed));
        assert!(error.is_usage_error());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_handoff_interrupted_by_close_reports_error() {
        let channel = StreamChannel::rendezvous();
        let sender = spawn_handoff(channel.clone(), 42);
        tokio::time::sleep(Duration::from_millis(20)).await;

        channel.close().unwrap();
        let result = timeout(Duration::from_millis(200), sender)
            .await
            .expect("クローズ後にハンドオフは終了するべきです")
            .unwrap();
        assert!(matches!(result, Err(ConcurrencyError::SendOnClosed)));
        assert_eq!(channel.receive().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_handoff_does_not_close() {
        let channel = StreamChannel::rendezvous();
        let sender = spawn_handoff(channel.clone(), 42);

        assert_eq!(channel.receive().await, Some(42));
        sender.await.unwrap().unwrap();
        assert_eq!(channel.state(), ChannelState::Open);
    }
}

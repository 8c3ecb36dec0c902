// カウンタベースの完了バリア

use crate::core::{ConcurrencyError, ConcurrencyResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct BarrierState {
    pending: AtomicUsize,
    cleared: Notify,
}

impl BarrierState {
    fn arrive(&self) {
        let previous = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |pending| {
                pending.checked_sub(1)
            });

        match previous {
            Ok(1) => self.cleared.notify_waiters(),
            Ok(_) => {}
            Err(_) => panic!("CompletionBarrier: done() called more times than register()"),
        }
    }
}

/// 保留カウンタによる完了バリア
///
/// `register` でカウンタを増やし、返された [`CompletionGuard`] が破棄されるたびに1減る。
/// 減算はガード経由でしか行えないため、登録数を超えた `done()` は API 上起こり得ない。
#[derive(Debug, Clone, Default)]
pub struct CompletionBarrier {
    state: Arc<BarrierState>,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `n` 件を登録し、各作業単位に渡すガードを返す
    ///
    /// 起動前に登録を済ませること。起動後に登録すると `wait` が早期に戻り得る。
    pub fn register(&self, n: usize) -> Vec<CompletionGuard> {
        self.state.pending.fetch_add(n, Ordering::AcqRel);
        (0..n)
            .map(|_| CompletionGuard {
                state: Arc::clone(&self.state),
            })
            .collect()
    }

    pub fn register_one(&self) -> CompletionGuard {
        self.state.pending.fetch_add(1, Ordering::AcqRel);
        CompletionGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// 未完了の作業単位数
    pub fn pending(&self) -> usize {
        self.state.pending.load(Ordering::Acquire)
    }

    pub fn is_clear(&self) -> bool {
        self.pending() == 0
    }

    /// カウンタが0になるまで待機
    pub async fn wait(&self) {
        loop {
            // 判定より先に通知を購読しておく（notify_waitersの取りこぼし防止）
            let cleared = self.state.cleared.notified();
            if self.is_clear() {
                return;
            }
            cleared.await;
        }
    }

    /// キャンセル可能な待機
    pub async fn wait_cancellable(&self, token: &CancellationToken) -> ConcurrencyResult<()> {
        tokio::select! {
            biased;
            _ = self.wait() => Ok(()),
            _ = token.cancelled() => Err(ConcurrencyError::cancelled("barrier wait")),
        }
    }
}

/// 1件分の完了通知
///
/// 破棄時（正常終了・早期リターン・パニック時の巻き戻しを含む）に必ず1回だけ `done()` する。
#[must_use = "dropping the guard immediately marks the unit of work as done"]
#[derive(Debug)]
pub struct CompletionGuard {
    state: Arc<BarrierState>,
}

impl CompletionGuard {
    /// 明示的に完了を通知する
    pub fn done(self) {
        drop(self);
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.state.arrive();
    }
}

// 容量制限付きストリームチャンネル
//
// 状態遷移: Open --close--> ClosedDraining --(キューが空)--> ClosedExhausted
// - Open: send はキューが容量に達していれば待機、receive は空なら待機
// - ClosedDraining: send は拒否、receive はバッファ済みの値を返し続ける
// - ClosedExhausted: receive は待機せずにストリーム終端（None）を返す
//
// 容量0は同期ハンドオフ。送信値は1スロットに置かれ、受信側が取り出すまで send は戻らない。
// 受け渡し前にクローズ・キャンセルされた値はスロットから取り下げられ、受信側には届かない。

use crate::core::{ChannelState, ConcurrencyError, ConcurrencyResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

#[derive(Debug)]
struct Inner<T> {
    queue: VecDeque<T>,
    state: ChannelState,
    enqueued: u64,
    dequeued: u64,
}

impl<T> Inner<T> {
    /// 容量0のスロットにある未受信の値を取り下げ、チケットを巻き戻す
    fn withdraw_offer(&mut self) -> Option<T> {
        let value = self.queue.pop_back()?;
        self.enqueued -= 1;
        Some(value)
    }
}

#[derive(Debug)]
struct Shared<T> {
    inner: Mutex<Inner<T>>,
    capacity: usize,
    /// 値の到着・クローズを受信側へ通知
    value_ready: Notify,
    /// 空き・受け取り完了・クローズを送信側へ通知
    space_ready: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// キューに同時に置ける値の数
    fn slot_limit(&self) -> usize {
        self.capacity.max(1)
    }
}

/// 容量制限付きの型付きチャンネル
///
/// クローンは同じチャンネルを共有する。クローズはプロデューサーが1回だけ行う前提で、
/// [`StreamChannel::close_guard`] を使えば全ての終了経路でクローズが保証される。
#[derive(Debug)]
pub struct StreamChannel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for StreamChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> StreamChannel<T> {
    /// 容量 `capacity` のチャンネルを作成（0 = 同期ハンドオフ）
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    queue: VecDeque::with_capacity(capacity.max(1)),
                    state: ChannelState::Open,
                    enqueued: 0,
                    dequeued: 0,
                }),
                capacity,
                value_ready: Notify::new(),
                space_ready: Notify::new(),
            }),
        }
    }

    /// 同期ハンドオフチャンネル
    pub fn rendezvous() -> Self {
        Self::new(0)
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// バッファ中の値の数
    ///
    /// 容量0では受け渡し待ちの値はバッファとみなさないため常に0。
    pub fn len(&self) -> usize {
        if self.shared.capacity == 0 {
            return 0;
        }
        self.shared.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> ChannelState {
        self.shared.lock().state
    }

    pub fn is_closed(&self) -> bool {
        self.state().is_closed()
    }

    /// 値を送信する
    ///
    /// 容量に達している間は待機する。容量0の場合は受信側が値を受け取るまで戻らない。
    /// クローズ済みのチャンネルへの送信は [`ConcurrencyError::SendOnClosed`] で拒否され、
    /// 値がキューに入ることはない。容量0で受け渡し待ちの間にクローズされた場合も同じエラーになる。
    ///
    /// `SendOnClosed` は利用側のバグを表すため、無視せずに `?` で伝播させること。
    pub async fn send(&self, value: T) -> ConcurrencyResult<()> {
        let ticket = loop {
            let space = self.shared.space_ready.notified();
            {
                let mut inner = self.shared.lock();
                if inner.state.is_closed() {
                    error!(capacity = self.shared.capacity, "send on closed channel rejected");
                    return Err(ConcurrencyError::SendOnClosed);
                }
                if inner.queue.len() < self.shared.slot_limit() {
                    inner.queue.push_back(value);
                    inner.enqueued += 1;
                    let ticket = inner.enqueued;
                    drop(inner);
                    self.shared.value_ready.notify_waiters();
                    break ticket;
                }
            }
            space.await;
        };

        if self.shared.capacity == 0 {
            return self.await_handoff(ticket).await;
        }
        Ok(())
    }

    /// 送信した値（`ticket` 番目）が受信されるまで待機
    ///
    /// 受信前にクローズされたら `SendOnClosed`。待機が中断された場合は [`PendingOffer`] が
    /// 値を取り下げる。
    async fn await_handoff(&self, ticket: u64) -> ConcurrencyResult<()> {
        let _offer = PendingOffer {
            shared: &self.shared,
            ticket,
        };
        loop {
            let taken = self.shared.space_ready.notified();
            {
                let inner = self.shared.lock();
                if inner.dequeued >= ticket {
                    return Ok(());
                }
                if inner.state.is_closed() {
                    drop(inner);
                    error!("channel closed before the handoff was received");
                    return Err(ConcurrencyError::SendOnClosed);
                }
            }
            taken.await;
        }
    }

    /// 値を受信する
    ///
    /// キューが空でクローズされていなければ待機する。クローズ済みかつ空なら `None`
    /// （ストリーム終端）を返す。
    pub async fn receive(&self) -> Option<T> {
        loop {
            let ready = self.shared.value_ready.notified();
            {
                let mut inner = self.shared.lock();
                if let Some(value) = inner.queue.pop_front() {
                    inner.dequeued += 1;
                    if inner.queue.is_empty() && inner.state == ChannelState::ClosedDraining {
                        inner.state = ChannelState::ClosedExhausted;
                    }
                    drop(inner);
                    self.shared.space_ready.notify_waiters();
                    return Some(value);
                }
                if inner.state.is_closed() {
                    inner.state = ChannelState::ClosedExhausted;
                    return None;
                }
            }
            ready.await;
        }
    }

    /// 待機せずに受信を試みる
    ///
    /// 値がなくクローズもされていない場合は `Ok(None)`、ストリーム終端なら `Err`。
    pub fn try_receive(&self) -> Result<Option<T>, ChannelState> {
        let mut inner = self.shared.lock();
        match inner.queue.pop_front() {
            Some(value) => {
                inner.dequeued += 1;
                if inner.queue.is_empty() && inner.state == ChannelState::ClosedDraining {
                    inner.state = ChannelState::ClosedExhausted;
                }
                drop(inner);
                self.shared.space_ready.notify_waiters();
                Ok(Some(value))
            }
            None if inner.state.is_closed() => {
                inner.state = ChannelState::ClosedExhausted;
                Err(ChannelState::ClosedExhausted)
            }
            None => Ok(None),
        }
    }

    /// キャンセル可能な送信
    ///
    /// キャンセル時に値がまだキューに入っていなければ破棄される。容量0で受け渡し待ちの
    /// 最中にキャンセルされた場合も、値はスロットから取り下げられる。
    pub async fn send_cancellable(
        &self,
        value: T,
        token: &CancellationToken,
    ) -> ConcurrencyResult<()> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(ConcurrencyError::cancelled("channel send")),
            result = self.send(value) => result,
        }
    }

    /// キャンセル可能な受信
    pub async fn receive_cancellable(
        &self,
        token: &CancellationToken,
    ) -> ConcurrencyResult<Option<T>> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(ConcurrencyError::cancelled("channel receive")),
            value = self.receive() => Ok(value),
        }
    }

    /// チャンネルをクローズする
    ///
    /// 二重クローズは [`ConcurrencyError::AlreadyClosed`]。
    pub fn close(&self) -> ConcurrencyResult<()> {
        if self.close_if_open() {
            Ok(())
        } else {
            warn!("close called on a channel that is already closed");
            Err(ConcurrencyError::AlreadyClosed)
        }
    }

    fn close_if_open(&self) -> bool {
        let withdrawn = {
            let mut inner = self.shared.lock();
            if inner.state.is_closed() {
                return false;
            }
            inner.state = ChannelState::ClosedDraining;
            // 容量0では残せるバッファがないので、受け渡し待ちの値は取り下げる
            let withdrawn = if self.shared.capacity == 0 {
                inner.withdraw_offer()
            } else {
                None
            };
            debug!(
                buffered = inner.queue.len(),
                withdrawn = withdrawn.is_some(),
                "channel closed"
            );
            withdrawn
        };
        drop(withdrawn);
        self.shared.value_ready.notify_waiters();
        self.shared.space_ready.notify_waiters();
        true
    }

    /// 破棄時にチャンネルをクローズするガードを取得
    pub fn close_guard(&self) -> CloseGuard<T> {
        CloseGuard {
            channel: self.clone(),
        }
    }
}

/// 容量0の送信で、受け渡し待ちの値を所有している間のガード
///
/// 受信されないまま破棄されたら値をスロットから取り下げる。スロットは1つなので、
/// 未受信の値は必ず自分のもの。
struct PendingOffer<'a, T> {
    shared: &'a Shared<T>,
    ticket: u64,
}

impl<T> Drop for PendingOffer<'_, T> {
    fn drop(&mut self) {
        let withdrawn = {
            let mut inner = self.shared.lock();
            if inner.dequeued >= self.ticket {
                return;
            }
            inner.withdraw_offer()
        };
        if withdrawn.is_some() {
            debug!(ticket = self.ticket, "pending handoff withdrawn");
            self.shared.space_ready.notify_waiters();
        }
    }
}

/// スコープ終了時にチャンネルをクローズするガード
///
/// 送信ループの正常終了・早期リターン・パニックのいずれでもクローズが実行される。
/// 既にクローズ済みなら何もしない。
#[must_use = "dropping the guard immediately closes the channel"]
#[derive(Debug)]
pub struct CloseGuard<T> {
    channel: StreamChannel<T>,
}

impl<T> Drop for CloseGuard<T> {
    fn drop(&mut self) {
        self.channel.close_if_open();
    }
}

// ストリームチャンネル
// 容量制限付き FIFO と明示的なクローズ状態を持つ送受信路

pub mod stream;

// 公開API
pub use stream::{CloseGuard, StreamChannel};

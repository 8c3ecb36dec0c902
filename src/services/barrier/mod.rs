// 完了バリア
// 登録済みの作業単位がすべて完了するまでコーディネーターを待機させる

pub mod completion;

// 公開API
pub use completion::{CompletionBarrier, CompletionGuard};

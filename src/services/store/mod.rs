// 結果ストア
// 並行ワーカーからの出力を排他ロック下で蓄積する

pub mod result_store;

// 公開API
pub use result_store::ResultStore;

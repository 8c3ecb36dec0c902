// エンジン層 - 並行実行とオーケストレーション
// サービス層のプリミティブを組み合わせて高レベルな処理を提供

pub mod api;
pub mod consumer;
pub mod demo_engine;
pub mod dispatcher;
pub mod producer;

// 公開API - 主要エンジンクラス
pub use api::{create_console_engine, create_engine, create_quiet_engine};
pub use consumer::{drain, drain_cancellable, spawn_consumer, ConsumedStream};
pub use demo_engine::{DemoEngine, HandoffOutcome, StreamOutcome};
pub use dispatcher::TaskDispatcher;
pub use producer::{produce_with, spawn_handoff, spawn_producer};

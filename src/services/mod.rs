// サービス層 - 機能別の同期プリミティブと具象実装
// 各サービスは特定の責任を持ち、疎結合で設計されている

pub mod barrier;
pub mod channel;
pub mod config;
pub mod monitoring;
pub mod store;
pub mod workload;

// 公開API - 各サービスの主要機能を明示的にエクスポート
pub use barrier::{CompletionBarrier, CompletionGuard};
pub use channel::{CloseGuard, StreamChannel};
pub use config::{DefaultDemoConfig, DEFAULT_DATASET};
pub use monitoring::{ConsoleProgressReporter, NoOpProgressReporter};
pub use store::ResultStore;
pub use workload::{RecordingQuery, SimulatedQuery};

pub mod cli;
pub mod core;
pub mod engine;
pub mod services;

// 主要な型を再エクスポート
pub use crate::core::{
    BatchReport, ChannelState, ConcurrencyError, ConcurrencyResult, DemoConfig, ProgressReporter,
    Task, Workload,
};
pub use engine::{DemoEngine, TaskDispatcher};
pub use services::{
    CompletionBarrier, CompletionGuard, DefaultDemoConfig, ResultStore, StreamChannel,
};

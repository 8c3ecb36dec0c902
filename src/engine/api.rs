// 高レベル公開API
// DemoEngineを簡単に使用できるようにするための便利な関数

use super::DemoEngine;
use crate::{
    core::{DemoConfig, ProgressReporter},
    services::{ConsoleProgressReporter, DefaultDemoConfig, NoOpProgressReporter},
};

/// 設定の `enable_progress_reporting` に応じて報告先を選んだエンジンを作成
pub fn create_engine(
    config: DefaultDemoConfig,
) -> DemoEngine<DefaultDemoConfig, Box<dyn ProgressReporter>> {
    let reporter: Box<dyn ProgressReporter> = if config.enable_progress_reporting() {
        Box::new(ConsoleProgressReporter::new())
    } else {
        Box::new(NoOpProgressReporter::new())
    };
    DemoEngine::new(config, reporter)
}

/// コンソールへ進捗を出すエンジンを作成
pub fn create_console_engine(
    config: DefaultDemoConfig,
) -> DemoEngine<DefaultDemoConfig, ConsoleProgressReporter> {
    DemoEngine::new(config, ConsoleProgressReporter::new())
}

/// 静音版のエンジンを作成（テスト・ベンチマーク用）
pub fn create_quiet_engine(
    config: DefaultDemoConfig,
) -> DemoEngine<DefaultDemoConfig, NoOpProgressReporter> {
    DemoEngine::new(config, NoOpProgressReporter::new())
}

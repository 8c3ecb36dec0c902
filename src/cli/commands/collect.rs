use crate::core::DemoConfig;
use crate::engine::create_engine;
use crate::services::{DefaultDemoConfig, DEFAULT_DATASET};
use anyhow::Result;

/// Execute collect command against the built-in dataset
pub async fn execute_collect(config: DefaultDemoConfig, json: bool) -> Result<()> {
    let dataset: Vec<String> = DEFAULT_DATASET.iter().map(|s| s.to_string()).collect();
    execute_collect_with_dataset(config, &dataset, json).await
}

/// Execute collect command against an arbitrary dataset
pub async fn execute_collect_with_dataset(
    config: DefaultDemoConfig,
    dataset: &[String],
    json: bool,
) -> Result<()> {
    if !json {
        println!("🔒 排他ロック付き結果収集開始");
        println!("   - タスク数: {}", config.batch_size());
        println!("   - 固定遅延: {}ms", config.fixed_latency().as_millis());
    }

    // JSON出力時は標準出力を汚さないよう進捗を止める
    let progress = config.enable_progress_reporting() && !json;
    let engine = create_engine(config.with_progress_reporting(progress));
    let report = engine.collect(dataset).await?;

    if json {
        let output = serde_json::json!({
            "records": report.records,
            "failures": report.failures,
            "summary": report.summary(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("📋 結果ストア（完了順）: {:?}", report.records);
        println!(
            "⏱️  結果収集の所要時間: {:.3}秒",
            report.elapsed.as_secs_f64()
        );
    }

    report.into_result()?;
    Ok(())
}

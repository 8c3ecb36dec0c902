use crate::core::DemoConfig;
use crate::engine::create_engine;
use crate::services::DefaultDemoConfig;
use anyhow::Result;

/// Execute fan-out command
pub async fn execute_fan_out(config: DefaultDemoConfig) -> Result<()> {
    println!("🔀 並行問い合わせ開始");
    println!("   - タスク数: {}", config.batch_size());
    println!("   - 最大遅延: {}ms", config.max_latency().as_millis());

    let engine = create_engine(config);
    let report = engine.fan_out().await;

    let mut timings = report.records.clone();
    timings.sort_by_key(|(task, _)| *task);
    for (task, latency) in &timings {
        println!("   - DB call {} took {:.3} seconds", task.id, latency.as_secs_f64());
    }
    println!(
        "⏱️  並行問い合わせの所要時間: {:.3}秒",
        report.elapsed.as_secs_f64()
    );

    report.into_result()?;
    Ok(())
}

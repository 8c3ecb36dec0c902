use crate::engine::create_quiet_engine;
use crate::services::DefaultDemoConfig;
use anyhow::Result;

/// Execute handoff command
pub async fn execute_handoff(value: i64) -> Result<()> {
    println!("🤝 同期ハンドオフ（容量0のチャンネル）");

    let engine = create_quiet_engine(DefaultDemoConfig::default());
    let outcome = engine.handoff(value).await?;

    println!("   - Value received from channel: {}", outcome.value);
    println!("⏱️  受け渡しの所要時間: {:.3}秒", outcome.elapsed.as_secs_f64());
    Ok(())
}

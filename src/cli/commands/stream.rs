use crate::core::DemoConfig;
use crate::engine::create_quiet_engine;
use crate::services::DefaultDemoConfig;
use anyhow::Result;

/// Execute stream command
pub async fn execute_stream(config: DefaultDemoConfig) -> Result<()> {
    let capacity = config.channel_capacity();
    let kind = if capacity == 0 { "バッファなし" } else { "バッファ付き" };

    println!("📨 ストリーム開始（{kind}、容量 {capacity}）");
    println!("   - 送信数: {}", config.stream_length());
    println!("   - 受信側の処理時間: {}ms/値", config.consumer_delay().as_millis());

    let engine = create_quiet_engine(config);
    let outcome = engine
        .stream(move |value| {
            println!("   - Value received from channel: {value}");
        })
        .await?;

    println!(
        "📤 プロデューサー完了: {}件送信 ({:.3}秒)",
        outcome.sent,
        outcome.producer_elapsed.as_secs_f64()
    );
    println!(
        "📥 コンシューマー完了: {}件受信 ({:.3}秒)",
        outcome.consumed.values.len(),
        outcome.total_elapsed.as_secs_f64()
    );
    if outcome.producer_finished_first() && capacity > 0 {
        println!("💡 バッファによりプロデューサーが先に完了しました");
    }
    Ok(())
}

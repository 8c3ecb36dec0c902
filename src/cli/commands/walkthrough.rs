use super::{execute_collect, execute_fan_out, execute_handoff, execute_stream};
use crate::services::DefaultDemoConfig;
use anyhow::Result;

/// Execute every demo in order
pub async fn execute_walkthrough(fast: bool, quiet: bool) -> Result<()> {
    let base = if fast {
        DefaultDemoConfig::fast()
    } else {
        DefaultDemoConfig::default()
    }
    .with_progress_reporting(!quiet);

    execute_fan_out(base.clone()).await?;
    println!();
    execute_collect(base.clone(), false).await?;
    println!();
    execute_handoff(42).await?;
    println!();
    execute_stream(base.clone().with_channel_capacity(0)).await?;
    println!();
    execute_stream(base).await?;

    println!("\n✅ 全デモ完了");
    Ok(())
}

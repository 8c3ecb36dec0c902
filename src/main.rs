use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use task_sync::{
    cli::{
        execute_collect, execute_fan_out, execute_handoff, execute_stream, execute_walkthrough,
        Cli, Commands,
    },
    DefaultDemoConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 標準出力はデモ出力に使うため、ログは標準エラーへ
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base = DefaultDemoConfig::default().with_progress_reporting(!cli.quiet);

    match cli.command {
        Commands::FanOut {
            tasks,
            max_latency_ms,
        } => {
            let config = base
                .with_batch_size(tasks)
                .with_max_latency(Duration::from_millis(max_latency_ms));
            execute_fan_out(config).await?;
        }
        Commands::Collect {
            tasks,
            latency_ms,
            json,
        } => {
            let mut config = base.with_fixed_latency(Duration::from_millis(latency_ms));
            if let Some(tasks) = tasks {
                config = config.with_batch_size(tasks);
            }
            execute_collect(config, json).await?;
        }
        Commands::Handoff { value } => {
            execute_handoff(value).await?;
        }
        Commands::Stream {
            capacity,
            count,
            consumer_delay_ms,
        } => {
            let config = base
                .with_channel_capacity(capacity)
                .with_stream_length(count)
                .with_consumer_delay(Duration::from_millis(consumer_delay_ms));
            execute_stream(config).await?;
        }
        Commands::Walkthrough { fast } => {
            execute_walkthrough(fast, cli.quiet).await?;
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "task_sync")]
#[command(about = "Concurrent fan-out, locked result collection and bounded channel demos")]
#[command(version)]
pub struct Cli {
    /// Suppress per-task progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run simulated queries with random latency concurrently and wait for all of them
    FanOut {
        /// Number of concurrent tasks
        #[arg(short, long, default_value = "5")]
        tasks: usize,

        /// Upper bound (exclusive) of the random latency per task
        #[arg(long, default_value = "2000")]
        max_latency_ms: u64,
    },

    /// Fetch dataset records concurrently into a lock-protected result store
    Collect {
        /// Number of concurrent tasks (defaults to the dataset length)
        #[arg(short, long)]
        tasks: Option<usize>,

        /// Fixed latency per task
        #[arg(long, default_value = "2000")]
        latency_ms: u64,

        /// Print the snapshot and summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Hand a single value over an unbuffered (capacity 0) channel
    Handoff {
        /// Value to send
        #[arg(short, long, default_value = "42", allow_negative_numbers = true)]
        value: i64,
    },

    /// Stream a sequence from a producer to a consumer through a bounded channel
    Stream {
        /// Channel capacity (0 = synchronous handoff)
        #[arg(short, long, default_value = "5")]
        capacity: usize,

        /// Number of values the producer sends
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,

        /// Simulated processing time per received value
        #[arg(long, default_value = "1000")]
        consumer_delay_ms: u64,
    },

    /// Run every demo in order
    Walkthrough {
        /// Use millisecond latencies instead of seconds
        #[arg(long)]
        fast: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_defaults() {
        let cli = Cli::try_parse_from(["task_sync", "fan-out"]).unwrap();
        assert!(!cli.quiet);
        assert_eq!(
            cli.command,
            Commands::FanOut {
                tasks: 5,
                max_latency_ms: 2000,
            }
        );
    }

    #[test]
    fn test_stream_arguments() {
        let cli = Cli::try_parse_from([
            "task_sync",
            "stream",
            "--capacity",
            "0",
            "-n",
            "3",
            "--consumer-delay-ms",
            "10",
            "--quiet",
        ])
        .unwrap();

        assert!(cli.quiet);
        assert_eq!(
            cli.command,
            Commands::Stream {
                capacity: 0,
                count: 3,
                consumer_delay_ms: 10,
            }
        );
    }

    #[test]
    fn test_handoff_negative_value() {
        let cli = Cli::try_parse_from(["task_sync", "handoff", "--value", "-7"]).unwrap();
        assert_eq!(cli.command, Commands::Handoff { value: -7 });
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["task_sync", "scan"]).is_err());
    }
}

use crate::demo::{run_demo, run_weights_validate, DemoArgs, WeightsValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use perf_eval::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Performance Evaluation Service",
    about = "Run and demonstrate weighted performance evaluations from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect criteria category weights
    Weights {
        #[command(subcommand)]
        command: WeightsCommand,
    },
    /// Run an end-to-end evaluation against the standard category catalog
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum WeightsCommand {
    /// Check the standard catalog weights, optionally with overrides or a rebalance
    Validate(WeightsValidateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Weights {
            command: WeightsCommand::Validate(args),
        } => run_weights_validate(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["perf-eval-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn weights_validate_collects_overrides() {
        let cli = Cli::try_parse_from([
            "perf-eval-api",
            "weights",
            "validate",
            "--set",
            "Technical Skills=50",
            "--set",
            "Delivery=20",
            "--rebalance",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Weights {
                command: WeightsCommand::Validate(args),
            }) => {
                assert_eq!(args.overrides.len(), 2);
                assert_eq!(args.overrides[1].0, "Delivery");
                assert!(args.rebalance);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn malformed_override_is_a_parse_error() {
        let result = Cli::try_parse_from(["perf-eval-api", "weights", "validate", "--set", "50"]);
        assert!(result.is_err());
    }
}

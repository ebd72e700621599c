use crate::demo::{run_demo, run_ledger, DemoArgs, LedgerArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use preschool_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Preschool Desk",
    about = "Run the preschool front office service or try it from the command line",
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
    /// Compute a fee ledger from a total fee and approved payments
    Ledger(LedgerArgs),
    /// Walk a parent and an admin through admission, payment and notices
    Demo(DemoArgs),
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
        Command::Ledger(args) => run_ledger(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preschool_desk::school::Money;

    #[test]
    fn ledger_arguments_parse_amounts() {
        let cli = Cli::try_parse_from([
            "preschool-desk-api",
            "ledger",
            "--class",
            "Nursery",
            "--approved",
            "15000",
            "--approved",
            "5000.50",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Ledger(args)) => {
                assert_eq!(args.class.as_deref(), Some("Nursery"));
                assert_eq!(args.total_fee, None);
                assert_eq!(args.approved, vec![Money(1_500_000), Money(500_050)]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["preschool-desk-api"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}

use clap::Parser;
use colored::Colorize;
use presentation::cli::{describe_error, Cli, CliApp};
use presentation::AppContext;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    shared::telemetry::init_tracing(verbose);

    let result = match AppContext::bootstrap() {
        Ok(context) => CliApp::new(context, verbose).run(cli.command).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{}", describe_error(&e).red());
        if verbose {
            eprintln!("{e:?}");
        } else {
            eprintln!("{}", "Run with --verbose for the full error.".dimmed());
        }
        std::process::exit(1);
    }
}

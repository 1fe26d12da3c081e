use std::env;

use clap::Parser;
use drawdown::api::{Cli, run_cli_report, run_http_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("drawdown=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            run_http_server(port).await?;
        }
        Some("report") => {
            let cli = Cli::parse_from(raw_args.iter().skip(1));
            print!("{}", run_cli_report(cli)?);
        }
        _ => {
            eprintln!("Usage: drawdown serve [port]");
            eprintln!("       drawdown report [--help | flags]");
            std::process::exit(1);
        }
    }

    Ok(())
}

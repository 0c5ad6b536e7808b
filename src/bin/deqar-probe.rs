use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use deqar_tools::client::build_http_client;
use deqar_tools::logging;
use deqar_tools::probe::{DEFAULT_ENDPOINT, DEFAULT_SUFFIX, Prober};
use tokio::io::BufReader;

/// Check which DEQAR accounts still use the default password.
///
/// Reads one username per line from stdin. Rejected logins are reported as
/// "changed or unknown": the endpoint does not say whether the account exists.
#[derive(Parser, Debug)]
#[command(name = "deqar-probe", version)]
struct Args {
    /// Token endpoint to log in against
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Appended to the username to form the default password
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    suffix: String,

    /// List network errors and 5xx responses separately
    #[arg(long)]
    separate_errors: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Log each attempt to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, "deqar_tools=debug");

    let http_client = build_http_client(Duration::from_secs(args.timeout))
        .context("Failed to initialize HTTP client")?;
    let prober = Prober::new(http_client, args.endpoint)
        .with_suffix(args.suffix)
        .with_separate_errors(args.separate_errors);

    let mut stdout = io::stdout().lock();
    let report = prober
        .run(BufReader::new(tokio::io::stdin()), &mut stdout)
        .await
        .context("Failed to read usernames from stdin")?;

    writeln!(stdout)?;
    writeln!(stdout, "{}", report)?;
    Ok(())
}

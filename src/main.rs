use std::env;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use deqar_tools::{ApiConfig, DeqarClient, Error, Personality, Result, Transcript, logging};

/// Send one request to the DEQAR API.
///
/// The personality decides method and route:
///   get|head <path>, post|put|patch <path> <file>,
///   submit <file>, filesubmit <report-id> <file>.
/// Trailing items: Header:Value, name==query, name=string, name:=json.
///
/// Symlinking this binary under a personality name (e.g. `get`) makes the
/// personality argument implicit.
#[derive(Parser, Debug)]
#[command(name = "deqar", version, verbatim_doc_comment)]
struct Args {
    /// Print the request and the response headers
    #[arg(short, long)]
    verbose: bool,

    /// Print only the response body, also for uploads
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Personality, its arguments and request items; -v/-q may appear anywhere
    #[arg(value_name = "ARGS")]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose, "deqar_tools=info");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("deqar: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let argv0 = env::args().next().unwrap_or_default();

    // Resolve the personality before touching config or network
    let (personality, rest) = match Personality::from_invocation(&argv0) {
        Some(personality) => (personality, &args.args[..]),
        None => match args.args.split_first() {
            Some((name, rest)) => (name.parse::<Personality>()?, rest),
            None => {
                return Err(Error::Usage(
                    "deqar <get|head|post|put|patch|submit|filesubmit> [args...]".to_string(),
                ));
            }
        },
    };

    let config = ApiConfig::from_env()?;
    tracing::info!("DEQAR API at {}", config.base);

    let mut client = DeqarClient::new(config)?;
    let descriptor = personality.build(client.config(), rest)?;
    client.authenticate().await?;

    let transcript = Transcript::new(args.verbose || (descriptor.is_upload() && !args.quiet));
    let request = client.prepare(&descriptor).await?;

    let mut stdout = io::stdout().lock();
    transcript.write_request(&mut stdout, &request)?;
    stdout.flush()?;

    let response = client.send(request).await?;
    transcript.write_response(&mut stdout, &response)?;
    stdout.flush()?;

    Ok(())
}

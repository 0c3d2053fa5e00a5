//! `dfc`: interactive client for the DFP dispersed file store.

#![forbid(unsafe_code)]

use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser;
use dfp_client::{ops, parse_line, Command, GetOutcome};
use dfp_core::ClientConfig;
use dfp_stripe::CompletenessRule;

/// DFP client REPL.
#[derive(Parser)]
#[command(name = "dfc")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Client configuration file (servers + credentials).
    conf: PathBuf,

    /// Treat files with only 2 distinct pieces as complete (historical
    /// behaviour; reconstruction may fail).
    #[arg(long)]
    legacy_completeness: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs to stderr; stdout belongs to the REPL.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();
    let config = ClientConfig::load(&args.conf)?;
    let rule = if args.legacy_completeness {
        CompletenessRule::Legacy
    } else {
        CompletenessRule::Strict
    };

    let stdin = std::io::stdin();
    loop {
        print!(">>> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break; // stdin closed
        }
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("<<< {err}");
                continue;
            }
        };

        match command {
            Command::Exit => {
                println!("<<< Goodbye!");
                break;
            }
            Command::List { folder } => match ops::list(&config, &folder, rule).await {
                Ok(output) => {
                    print_faults(&output.faults);
                    for file in &output.files {
                        if file.complete {
                            println!("{}", file.name);
                        } else {
                            println!("{} [INCOMPLETE]", file.name);
                        }
                    }
                    for folder in &output.folders {
                        println!("{folder}");
                    }
                }
                Err(err) => println!("<<< {err}"),
            },
            Command::Get { remote, local } => {
                match ops::get(&config, &remote, &local, rule).await {
                    Ok(output) => {
                        print_faults(&output.faults);
                        match output.outcome {
                            GetOutcome::NotFound => {
                                println!("<<< File not found on any server");
                            }
                            GetOutcome::Incomplete => println!("<<< File is incomplete"),
                            GetOutcome::Written { .. } => {}
                        }
                    }
                    Err(err) => println!("<<< {err}"),
                }
            }
            Command::Put { local, remote } => match ops::put(&config, &local, &remote).await {
                Ok(output) => {
                    print_faults(&output.faults);
                    if output.delivered {
                        println!("<<< File uploaded successfully!");
                    } else {
                        println!("<<< File upload failed!");
                    }
                }
                Err(err) => println!("<<< {err}"),
            },
            Command::Mkdir { folder } => match ops::mkdir(&config, &folder).await {
                Ok(output) => print_faults(&output.faults),
                Err(err) => println!("<<< {err}"),
            },
        }
    }

    Ok(())
}

fn print_faults(faults: &[dfp_client::ServerFault]) {
    for fault in faults {
        println!("<<< Error Message: {}", fault.message);
    }
}

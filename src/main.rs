use std::io::Write;

use anyhow::Result;
use clap::Parser;
use rfcindex::cli::{Cli, Commands, OutputArgs, SeriesArgs};
use rfcindex::commands::{self, Output};
use rfcindex::config::Config;
use rfcindex::document::DocType;
use rfcindex::query::Outcome;
use rfcindex::search::AuthorQuery;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Ingest { index }) => {
            let stats = commands::ingest(index.as_deref())?;
            println!(
                "Ingested {} RFCs, {} STDs, {} BCPs, {} FYIs and {} not-issued numbers.",
                stats.rfc, stats.std, stats.bcp, stats.fyi, stats.not_issued
            );
            Ok(())
        }
        Some(Commands::Rfc {
            mode,
            output,
            numbers,
        }) => {
            let outcome = commands::resolve(DocType::Rfc, &numbers, mode.mode())?;
            print_outcome(&outcome, output)
        }
        Some(Commands::Bcp(args)) => series(DocType::Bcp, &args),
        Some(Commands::Std(args)) => series(DocType::Std, &args),
        Some(Commands::Fyi(args)) => series(DocType::Fyi, &args),
        Some(Commands::Author {
            names,
            titles,
            organizations,
            org_abbrevs,
            output,
        }) => {
            let query = AuthorQuery {
                names,
                titles,
                organizations,
                org_abbrevs,
            };
            print_outcome(&commands::author(&query)?, output)
        }
        Some(Commands::Title { output, titles }) => {
            print_outcome(&commands::title(&titles)?, output)
        }
        Some(Commands::Keyword { output, words }) => {
            print_outcome(&commands::keyword(&words)?, output)
        }
        #[cfg(feature = "mcp")]
        Some(Commands::Serve) => tokio::runtime::Runtime::new()?.block_on(rfcindex::mcp::serve()),
        None => {
            Cli::parse_from(["rfcindex", "--help"]);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "rfcindex=debug" } else { "rfcindex=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn series(doc_type: DocType, args: &SeriesArgs) -> Result<()> {
    let outcome = commands::resolve(doc_type, &args.numbers, args.mode())?;
    print_outcome(&outcome, args.output)
}

fn print_outcome(outcome: &Outcome, output: OutputArgs) -> Result<()> {
    let output = Output::from_flags(output.paths, output.json);
    let mirror = Config::load()?.mirror();
    let text = commands::render(outcome, output, &mirror)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    if output != Output::Json {
        let reasons = commands::render_unresolved(outcome);
        if !reasons.is_empty() && !outcome.found.is_empty() && output == Output::Records {
            writeln!(stdout)?;
        }
        stdout.write_all(reasons.as_bytes())?;
    }
    Ok(())
}

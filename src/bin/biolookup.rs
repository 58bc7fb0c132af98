//! biolookup demo binary
//!
//! Resolves the CURIEs given on the command line and prints one JSON result
//! per line. The backend is chosen from the environment (see `biolookup::api`).

use biolookup::api;
use biolookup::LookupOptions;
use tracing_subscriber::EnvFilter;

/// Command line options
#[derive(Debug, Default)]
struct Options {
    /// CURIEs to resolve
    curies: Vec<String>,
    /// Print per-prefix counts instead of resolving
    summary: bool,
    /// Do not follow alternate identifiers
    no_alternates: bool,
}

fn parse_args() -> Options {
    let mut options = Options::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--summary" | "-s" => options.summary = true,
            "--no-alternates" => options.no_alternates = true,
            "--help" | "-h" => {
                println!("biolookup - resolve CURIEs to names and metadata");
                println!();
                println!("USAGE:");
                println!("    biolookup [OPTIONS] <CURIE>...");
                println!();
                println!("OPTIONS:");
                println!("    -s, --summary          Print per-prefix counts");
                println!("        --no-alternates    Do not follow alternate identifiers");
                println!("    -h, --help             Print help information");
                println!();
                println!("ENVIRONMENT:");
                println!("    BIOLOOKUP_BACKEND       sql, memory or remote [default: sql]");
                println!("    BIOLOOKUP_DATABASE_URL  SQL connection string");
                println!("    BIOLOOKUP_REGISTRY      JSON prefix registry");
                println!("    RUST_LOG                log filter [default: info]");
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => {
                eprintln!("error: unknown argument: {flag}");
                std::process::exit(1);
            }
            curie => options.curies.push(curie.to_string()),
        }
    }
    options
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = parse_args();
    if options.curies.is_empty() && !options.summary {
        eprintln!("error: at least one CURIE is required (see --help)");
        std::process::exit(1);
    }

    let resolver = api::default_resolver().await?;

    if options.summary {
        for row in resolver.summarize_all().await? {
            println!("{}", serde_json::to_string(&row)?);
        }
    }

    let lookup_options = if options.no_alternates {
        LookupOptions::without_alternates()
    } else {
        LookupOptions::default()
    };
    for curie in &options.curies {
        let result = resolver.lookup_with(curie, lookup_options).await?;
        println!("{}", serde_json::to_string(&result)?);
    }
    Ok(())
}

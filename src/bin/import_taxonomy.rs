use std::path::PathBuf;
use std::process;

use arthropod_gallery::config::AppConfig;
use arthropod_gallery::ingest::parse_dump;
use arthropod_gallery::state::taxonomy::TaxonomyDb;
use clap::Parser;

/// Load an indented taxonomy dump into the gallery's taxonomy database
#[derive(Debug, Parser)]
#[command(name = "import-taxonomy", version)]
struct Cli {
    /// Dump with one "<id> [<rank>] <name>" per line, indented by depth
    dump: PathBuf,

    /// Target database (defaults to the configured taxonomy database)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

fn main() {
    arthropod_gallery::init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> arthropod_gallery::Result<()> {
    let config = AppConfig::load()?;
    let database = cli.database.unwrap_or(config.taxonomy_db);

    let text = std::fs::read_to_string(&cli.dump)?;
    let report = parse_dump(&text)?;

    let mut db = TaxonomyDb::open(&database)?;
    db.insert_taxa(&report.taxa)?;

    println!(
        "Imported {} taxa into {} ({} filtered, {} unparsed lines)",
        report.taxa.len(),
        database.display(),
        report.filtered,
        report.unparsed
    );
    Ok(())
}

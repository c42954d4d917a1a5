use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use postmerge::index::{build, stats, IndexReader, TermIndex};
use postmerge::merge::MergeOp;
use postmerge::output;
use postmerge::query::{QueryConfig, QueryExecutor, QueryRequest, QueryResult};
use postmerge::utils::Settings;
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "postmerge")]
#[command(about = "Boolean posting merge with BM25 scoring over an inverted index")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    query: QueryArgs,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

/// Query mode options (only valid without a subcommand)
#[derive(Args)]
struct QueryArgs {
    /// Index directory to query
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Query term (repeatable)
    #[arg(short = 't', long = "term")]
    terms: Vec<String>,

    /// Merge operator: AND or OR
    #[arg(short = 'o', long = "op")]
    op: Option<String>,

    /// Stop after this many hits
    #[arg(short = 'n', long)]
    max_hits: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

impl QueryArgs {
    fn is_empty(&self) -> bool {
        self.path.is_none()
            && self.terms.is_empty()
            && self.op.is_none()
            && self.max_hits.is_none()
            && !self.json
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a directory of text files
    Index {
        /// Directory to index
        corpus: PathBuf,

        /// Where to write the index
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show index statistics
    Stats {
        /// Index directory
        index: PathBuf,
    },
    /// Run a JSON array of queries against one index
    Batch {
        /// Index directory
        index: PathBuf,

        /// File holding `[{"terms": [...], "op": "AND"}, ...]`, or `-` for stdin
        file: PathBuf,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("POSTMERGE_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let color = !cli.no_color;
    let config = cli.config.as_deref();

    match cli.command {
        Some(command) => {
            if !cli.query.is_empty() {
                bail!("query options (-p, -t, -o, -n, --json) cannot be combined with a subcommand");
            }
            // --config is validated for every command
            let settings = load_settings(config)?;
            match command {
                Commands::Index { corpus, output } => {
                    build::build_index(&corpus, &output, cli.quiet)?;
                }
                Commands::Stats { index } => {
                    stats::show_stats(&index)?;
                }
                Commands::Batch { index, file, json } => {
                    run_batch(&index, &file, &settings, json, color)?;
                }
            }
        }
        None => {
            let query = cli.query;
            let Some(path) = query.path else {
                bail!("missing index path (use -p <index>)");
            };
            if query.terms.is_empty() {
                bail!("no query terms given (use -t <term>)");
            }

            let mut settings = load_settings(config)?;
            if query.max_hits.is_some() {
                settings.max_hits = query.max_hits;
                settings.validate()?;
            }

            let query_config = QueryConfig {
                index_path: path,
                terms: query.terms,
                op: query.op.as_deref().map_or(MergeOp::Undefined, MergeOp::parse_lenient),
            };
            run_query(&query_config, &settings, query.json, color)?;
        }
    }

    Ok(())
}

fn run_query(config: &QueryConfig, settings: &Settings, json: bool, color: bool) -> Result<()> {
    let reader = config.open()?;
    info!(
        op = %config.op,
        terms = config.terms.len(),
        doc_count = reader.doc_count(),
        avg_doc_len = reader.avg_doc_len(),
        k1 = settings.bm25.k1,
        b = settings.bm25.b,
        "running query"
    );

    let result = config.execute(&reader, settings)?;
    if json {
        output::write_json(&mut io::stdout().lock(), &result)?;
    } else {
        output::print_result(&result, &reader, color)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    terms: &'a [String],
    op: MergeOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a QueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn run_batch(index: &Path, file: &Path, settings: &Settings, json: bool, color: bool) -> Result<()> {
    let content = if file == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read queries from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?
    };
    let requests: Vec<QueryRequest> =
        serde_json::from_str(&content).context("Failed to parse query batch")?;

    let reader = IndexReader::open(index)?;
    let executor = QueryExecutor::with_settings(&reader, settings.clone());
    let results = executor.execute_batch(&requests);
    info!(queries = requests.len(), "batch finished");

    if json {
        let entries: Vec<BatchEntry<'_>> = requests
            .iter()
            .zip(&results)
            .map(|(request, result)| BatchEntry {
                terms: &request.terms,
                op: request.op,
                result: result.as_ref().ok(),
                error: result.as_ref().err().map(|e| e.to_string()),
            })
            .collect();
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &entries)?;
        writeln!(stdout)?;
        return Ok(());
    }

    for (i, (request, result)) in requests.iter().zip(&results).enumerate() {
        if i > 0 {
            println!();
        }
        println!("# {} {}", request.op, request.terms.join(" "));
        match result {
            Ok(result) => output::print_result(result, &reader, color)?,
            Err(e) => println!("error: {}", e),
        }
    }
    Ok(())
}

//! prefdb CLI
//!
//! Command-line access to a file-backed prefdb collection of untyped JSON
//! documents.

use clap::{Args as ClapArgs, Parser, Subcommand};
use prefdb::{Config, FileSubstrate, Filter, FindOptions, PrefDbError, SortDirection, SortKey, Store};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

type JsonStore = Store<FileSubstrate, String, Value>;

/// prefdb CLI
#[derive(Parser, Debug)]
#[command(name = "prefdb-cli")]
#[command(about = "CLI for the prefdb document store")]
#[command(version)]
struct Args {
    /// Substrate file
    #[arg(short, long, default_value = "./prefdb.json")]
    file: String,

    /// Key namespace
    #[arg(short, long, default_value = Config::DEFAULT_NAMESPACE)]
    namespace: String,

    /// Collection prefix
    #[arg(short, long, default_value = "document")]
    prefix: String,

    /// Store documents compressed
    #[arg(short, long)]
    compress: bool,

    /// Ids per scan chunk
    #[arg(long, default_value_t = Config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug)]
struct QueryArgs {
    /// Query document, e.g. '{"age": {"$gte": 18}}'
    #[arg(short, long)]
    query: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert or replace a document
    Insert {
        /// Document id
        id: String,

        /// Document JSON
        document: String,
    },

    /// Get a document by id
    Get {
        /// Document id
        id: String,
    },

    /// Find documents
    Find {
        #[command(flatten)]
        query: QueryArgs,

        /// Sort key as field:1 or field:-1 (repeatable)
        #[arg(short, long, value_parser = parse_sort_key)]
        sort: Vec<SortKey>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Count documents
    Count {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Delete a document by id
    Delete {
        /// Document id
        id: String,
    },

    /// Delete all documents (or those matching --query)
    DeleteAll {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// List ids in insertion order
    Ids,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,prefdb=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> prefdb::Result<()> {
    let config = Config::builder()
        .namespace(&args.namespace)
        .prefix(&args.prefix)
        .compress(args.compress)
        .chunk_size(args.chunk_size)
        .build();

    let substrate = FileSubstrate::open(&args.file)?;
    let store: JsonStore = Store::open(substrate, config)?;

    match args.command {
        Commands::Insert { id, document } => {
            let document: Value = serde_json::from_str(&document)
                .map_err(|e| PrefDbError::Serialization(format!("document is not JSON: {}", e)))?;
            let saved = store.insert(id, document)?;
            print_json(&saved)
        }
        Commands::Get { id } => print_json(&store.find_by_uid(&id)?),
        Commands::Find { query, sort, limit } => {
            let filter = parse_query(&query)?;
            let mut options = FindOptions::new().sort(sort);
            options.limit = limit;
            let documents = store.find_all(filter.as_ref(), &options)?;
            print_json(&Value::Array(documents))
        }
        Commands::Count { query } => {
            let filter = parse_query(&query)?;
            println!("{}", store.count(filter.as_ref())?);
            Ok(())
        }
        Commands::Delete { id } => store.delete(&id),
        Commands::DeleteAll { query } => {
            let filter = parse_query(&query)?;
            store.delete_all(filter.as_ref())
        }
        Commands::Ids => {
            for id in store.ids()? {
                println!("{}", id);
            }
            Ok(())
        }
    }
}

fn parse_query(args: &QueryArgs) -> prefdb::Result<Option<Filter>> {
    let text = match &args.query {
        Some(text) => text,
        None => return Ok(None),
    };
    let query: Value = serde_json::from_str(text)
        .map_err(|e| PrefDbError::InvalidQuery(format!("query is not JSON: {}", e)))?;
    Filter::from_query(&query).map(Some)
}

/// Parse `field:1`, `field:-1`, `field:asc` or `field:desc` (bare `field` sorts ascending)
fn parse_sort_key(raw: &str) -> Result<SortKey, String> {
    let (path, direction) = match raw.rsplit_once(':') {
        Some((path, dir)) => (path, dir),
        None => (raw, "1"),
    };
    if path.is_empty() {
        return Err(format!("missing field in sort key {:?}", raw));
    }

    let direction = match direction {
        "asc" => SortDirection::Ascending,
        "desc" => SortDirection::Descending,
        n => SortDirection::from_sign(
            n.parse::<i64>()
                .map_err(|_| format!("invalid sort direction {:?}", n))?,
        ),
    };
    Ok(SortKey::new(path, direction))
}

fn print_json(value: &Value) -> prefdb::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| PrefDbError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

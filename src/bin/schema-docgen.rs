//! Schema Docgen CLI
//!
//! Command-line interface for resolving JSON Schemas into documentation data.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use schema_docgen::{generate, GeneratorOptions, SchemaRepository, SchemaResolver, TypeCatalog};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "schema-docgen")]
#[command(about = "Resolve JSON Schema references and inheritance for documentation")]
#[command(version)]
struct Cli {
    /// Log resolution progress (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SearchArgs {
    /// Directory probed for referenced schemas before the input directories
    #[arg(long, short = 's')]
    search_path: Option<PathBuf>,

    /// Further directories probed for referenced schemas
    #[arg(long = "search-paths", short = 'S', num_args = 1..)]
    search_paths: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve root schemas and print the flattened view of every type
    Resolve {
        /// Root schema files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        search: SearchArgs,

        /// Type names that get no section of their own
        #[arg(long, short = 'i', num_args = 1..)]
        ignore: Vec<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the known type names of root schemas and what they reference
    Types {
        /// Root schema files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        search: SearchArgs,

        /// Type names that are not linked
        #[arg(long, short = 'i', num_args = 1..)]
        ignore: Vec<String>,
    },

    /// Merge a schema with its bases into a single schema
    Flatten {
        /// Schema file
        schema: PathBuf,

        #[command(flatten)]
        search: SearchArgs,

        /// Express `required` as boolean flags on the properties
        #[arg(long)]
        normalize_required: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Resolve {
            inputs,
            search,
            ignore,
            output,
            pretty,
        } => run_resolve(options(inputs, search, ignore), output, pretty),

        Commands::Types {
            inputs,
            search,
            ignore,
        } => run_types(options(inputs, search, ignore)),

        Commands::Flatten {
            schema,
            search,
            normalize_required,
            output,
            pretty,
        } => run_flatten(
            options(vec![schema], search, Vec::new()),
            normalize_required,
            output,
            pretty,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr; stdout carries the JSON output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn options(inputs: Vec<PathBuf>, search: SearchArgs, ignore: Vec<String>) -> GeneratorOptions {
    let mut options = GeneratorOptions::new(inputs)
        .extra_search_paths(search.search_paths)
        .ignore(ignore);
    if let Some(path) = search.search_path {
        options = options.search_path(path);
    }
    options
}

fn run_resolve(options: GeneratorOptions, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let documentation = generate(&options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    write_json(&documentation, output, pretty)
}

fn run_types(options: GeneratorOptions) -> Result<(), u8> {
    let mut repository = SchemaRepository::new(options.search_paths());
    for input in &options.input_paths {
        repository
            .add_root_schema(&input.to_string_lossy())
            .map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
    }

    let catalog = TypeCatalog::build(&repository, &options.ignorable_type_names);
    for name in catalog.known_type_names() {
        if catalog.linked_type_names().contains(name) {
            println!("{} (linked)", name);
        } else {
            println!("{}", name);
        }
    }
    Ok(())
}

fn run_flatten(
    options: GeneratorOptions,
    normalize_required: bool,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let mut repository = SchemaRepository::new(options.search_paths());
    let report = |e: schema_docgen::RepositoryError| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    };

    let mut flattened = Vec::with_capacity(options.input_paths.len());
    for input in &options.input_paths {
        let entry = repository
            .add_root_schema(&input.to_string_lossy())
            .map_err(report)?;
        let schema = SchemaResolver::new(&mut repository)
            .flatten(&entry, normalize_required)
            .map_err(report)?;
        flattened.push(schema);
    }

    match flattened.as_slice() {
        [single] => write_json(single, output, pretty),
        _ => write_json(&flattened, output, pretty),
    }
}

fn write_json<T: Serialize + ?Sized>(value: &T, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

// Command-line interface for nodesync
//
// This binary moves source code between its concrete syntax tree and an editable node graph.
// The tree itself is produced by a grammar parser outside this project and handed over as
// tree JSON; the node kinds come from a schema XML document.
//
// Usage:
//  nodesync forward <tree.json> [--schema <xml>] [-o <graph.json>]     - Tree → graph JSON
//  nodesync backward <graph.json> [--formatter <name>] [-o <file>]     - Graph → source text
//  nodesync roundtrip <tree.json> [--schema <xml>] [--formatter <name>] - Tree → graph → text
//  nodesync inspect <tree.json> [<view>] [--schema <xml>]              - Show a view (defaults to "converted-treeviz")
//  nodesync schema [--schema <xml>] [--filter <text>]                  - List template names
//
// --schema falls back to `schema.path` from the configuration (nodesync.toml or --config).
//
// Extra Parameters:
//
// View-specific parameters can be passed using --extra-<parameter-name> <value>.
// The CLI layer strips the "extra-" prefix and passes the parameters to the view.
// Example:
//  nodesync inspect tree.json graph-treeviz --extra-show-ids

mod views;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use nodesync_config::{Loader, NodeSyncConfig};
use nodesync_core::graph::NodeGraph;
use nodesync_core::registry::FormatterRegistry;
use nodesync_core::schema::{SchemaCatalog, SchemaDocument, SharedCatalog};
use nodesync_core::sync::{SyncOptions, Synchronizer};
use nodesync_core::tree::JsonTreeParser;
use nodesync_core::ForwardReport;
use std::collections::HashMap;
use std::fs;
use tracing_subscriber::EnvFilter;

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if let Some(key) = arg.strip_prefix("--extra-") {
            let has_value = args.get(i + 1).is_some_and(|next| !next.starts_with('-'));
            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn schema_arg() -> Arg {
    Arg::new("schema")
        .long("schema")
        .short('s')
        .value_name("XML")
        .help("Schema XML declaring the node kinds (defaults to schema.path from config)")
        .value_hint(ValueHint::FilePath)
}

fn formatter_arg() -> Arg {
    Arg::new("formatter")
        .long("formatter")
        .short('f')
        .help("Formatter applied to emitted text (defaults to convert.backward.formatter)")
        .value_hint(ValueHint::Other)
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Output file path (defaults to stdout)")
        .value_hint(ValueHint::FilePath)
}

fn input_arg(help: &'static str) -> Arg {
    Arg::new("input")
        .help(help)
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn build_cli() -> Command {
    Command::new("nodesync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert between syntax trees and editable node graphs")
        .long_about(
            "nodesync converts a concrete syntax tree into a graph of typed nodes and a\n\
            node graph back into source text. Node kinds come from a schema XML document.\n\n\
            Examples:\n  \
            nodesync forward tree.json --schema Syntax.xml -o graph.json\n  \
            nodesync backward graph.json --formatter whitespace\n  \
            nodesync roundtrip tree.json --schema Syntax.xml\n  \
            nodesync inspect tree.json graph-treeviz --extra-show-ids\n  \
            nodesync schema --schema Syntax.xml --filter expression",
        )
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a nodesync.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log conversion details to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("forward")
                .about("Convert tree JSON into graph JSON")
                .arg(input_arg("Tree JSON file"))
                .arg(schema_arg())
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("backward")
                .about("Emit source text from graph JSON")
                .arg(input_arg("Graph JSON file"))
                .arg(formatter_arg())
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("roundtrip")
                .about("Convert tree JSON to a graph and straight back to text")
                .arg(input_arg("Tree JSON file"))
                .arg(schema_arg())
                .arg(formatter_arg())
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Inspect the stages of a forward conversion")
                .long_about(
                    "View a tree at different stages of forward conversion.\n\n\
                    Views (stage-format):\n  \
                    - tree-json:          the tree as read\n  \
                    - converted-treeviz:  converted instances (default)\n  \
                    - graph-treeviz:      the node graph, walked from its roots\n  \
                    - graph-json:         the node graph as JSON\n\n\
                    Extra Parameters:\n  \
                    --extra-show-ids      Label nodes with their instance ids",
                )
                .arg(input_arg("Tree JSON file"))
                .arg(
                    Arg::new("view")
                        .help("View to render. Defaults to 'converted-treeviz'")
                        .required(false)
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            views::AVAILABLE_VIEWS,
                        ))
                        .index(2)
                        .value_hint(ValueHint::Other),
                )
                .arg(schema_arg()),
        )
        .subcommand(
            Command::new("schema")
                .about("List the templates a schema declares")
                .arg(schema_arg())
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .help("Only list names containing this text (case-insensitive)")
                        .value_hint(ValueHint::Other),
                ),
        )
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let (cleaned_args, extra_params) = parse_extra_args(&args);
    let matches = build_cli().get_matches_from(&cleaned_args);

    let config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));
    init_logging(&config, matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("forward", sub_matches)) => handle_forward_command(sub_matches, &config),
        Some(("backward", sub_matches)) => handle_backward_command(sub_matches, &config),
        Some(("roundtrip", sub_matches)) => handle_roundtrip_command(sub_matches, &config),
        Some(("inspect", sub_matches)) => {
            handle_inspect_command(sub_matches, &extra_params, &config)
        }
        Some(("schema", sub_matches)) => handle_schema_command(sub_matches, &config),
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

/// Handle the forward command
fn handle_forward_command(matches: &ArgMatches, config: &NodeSyncConfig) {
    let source = read_input(matches);
    let sync = synchronizer(matches, config);

    let synced = sync.code_to_graph(&source).unwrap_or_else(|e| {
        eprintln!("Conversion error: {e}");
        std::process::exit(1);
    });
    report_gaps(&synced.report, config);

    let json = synced.graph.to_json().unwrap_or_else(|e| {
        eprintln!("Serialization error: {e}");
        std::process::exit(1);
    });
    write_output(matches, &format!("{json}\n"));
}

/// Handle the backward command
fn handle_backward_command(matches: &ArgMatches, config: &NodeSyncConfig) {
    let source = read_input(matches);
    let graph = NodeGraph::from_json(&source).unwrap_or_else(|e| {
        eprintln!("Graph error: {e}");
        std::process::exit(1);
    });

    // Backward conversion needs no schema: instances carry their templates.
    let sync = Synchronizer::new(
        SharedCatalog::from_catalog(SchemaCatalog::new(SchemaDocument::default())),
        JsonTreeParser,
    )
    .with_options(sync_options(matches, config));

    let text = sync.graph_to_code(&graph).unwrap_or_else(|e| {
        eprintln!("Emission error: {e}");
        std::process::exit(1);
    });
    write_output(matches, &format!("{text}\n"));
}

/// Handle the roundtrip command
fn handle_roundtrip_command(matches: &ArgMatches, config: &NodeSyncConfig) {
    let source = read_input(matches);
    let sync = synchronizer(matches, config);

    let synced = sync.code_to_graph(&source).unwrap_or_else(|e| {
        eprintln!("Conversion error: {e}");
        std::process::exit(1);
    });
    report_gaps(&synced.report, config);

    let text = sync.graph_to_code(&synced.graph).unwrap_or_else(|e| {
        eprintln!("Emission error: {e}");
        std::process::exit(1);
    });
    write_output(matches, &format!("{text}\n"));
}

/// Handle the inspect command
fn handle_inspect_command(
    matches: &ArgMatches,
    extra_params: &HashMap<String, String>,
    config: &NodeSyncConfig,
) {
    let source = read_input(matches);
    let catalog = load_catalog(matches, config);
    let view = matches
        .get_one::<String>("view")
        .map(|s| s.as_str())
        .unwrap_or(views::DEFAULT_VIEW);

    let output = views::execute_view(&source, &catalog, view, extra_params).unwrap_or_else(|e| {
        eprintln!("Execution error: {e}");
        std::process::exit(1);
    });
    if let Some(report) = &output.report {
        report_gaps(report, config);
    }

    print!("{}", output.text);
}

/// Handle the schema command
fn handle_schema_command(matches: &ArgMatches, config: &NodeSyncConfig) {
    let catalog = load_catalog(matches, config);
    let names: Vec<&str> = match matches.get_one::<String>("filter") {
        Some(filter) => catalog.filter_names(filter),
        None => catalog.names().iter().map(String::as_str).collect(),
    };

    for name in names {
        println!("{name}");
    }
}

fn load_cli_config(explicit_path: Option<&str>) -> NodeSyncConfig {
    let loader = Loader::new().with_optional_file("nodesync.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

fn init_logging(config: &NodeSyncConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.log.level.as_str() };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|err| {
        eprintln!("Invalid log level '{level}': {err}");
        std::process::exit(1);
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Schema path from `--schema`, falling back to the configured one.
fn schema_path(matches: &ArgMatches, config: &NodeSyncConfig) -> String {
    matches
        .get_one::<String>("schema")
        .cloned()
        .or_else(|| config.schema.path.clone())
        .unwrap_or_else(|| {
            eprintln!("No schema given. Pass --schema <xml> or set schema.path in nodesync.toml");
            std::process::exit(1);
        })
}

fn load_catalog(matches: &ArgMatches, config: &NodeSyncConfig) -> SchemaCatalog {
    let path = schema_path(matches, config);
    let source = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading schema '{path}': {e}");
        std::process::exit(1);
    });
    SchemaCatalog::from_xml(&source).unwrap_or_else(|e| {
        eprintln!("Schema error in '{path}': {e}");
        std::process::exit(1);
    })
}

fn synchronizer(matches: &ArgMatches, config: &NodeSyncConfig) -> Synchronizer<JsonTreeParser> {
    let catalog = load_catalog(matches, config);
    Synchronizer::new(SharedCatalog::from_catalog(catalog), JsonTreeParser)
        .with_options(sync_options(matches, config))
}

/// `--formatter` when present, otherwise `convert.backward.formatter`.
fn sync_options(matches: &ArgMatches, config: &NodeSyncConfig) -> SyncOptions {
    let options = match matches.try_get_one::<String>("formatter").ok().flatten() {
        Some(name) if name == "none" => SyncOptions::default(),
        Some(name) => SyncOptions::with_formatter(name.as_str()),
        None => SyncOptions::from(&config.convert.backward),
    };

    if let Some(name) = &options.formatter {
        let registry = FormatterRegistry::default();
        if !registry.has(name) {
            eprintln!(
                "Unknown formatter '{name}'. Available: {}",
                registry.list().join(", ")
            );
            std::process::exit(1);
        }
    }
    options
}

fn report_gaps(report: &ForwardReport, config: &NodeSyncConfig) {
    if !config.convert.forward.report_gaps || report.is_complete() {
        return;
    }
    eprintln!(
        "Skipped {} subtree(s) the schema does not cover: {}",
        report.skipped.len(),
        report.skipped.join(", ")
    );
}

fn read_input(matches: &ArgMatches) -> String {
    let path = matches
        .get_one::<String>("input")
        .map(|s| s.as_str())
        .unwrap_or_default();
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

fn write_output(matches: &ArgMatches, text: &str) {
    match matches.get_one::<String>("output") {
        Some(path) => fs::write(path, text).unwrap_or_else(|e| {
            eprintln!("Error writing file '{path}': {e}");
            std::process::exit(1);
        }),
        None => print!("{text}"),
    }
}

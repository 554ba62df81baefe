use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the views from src/views.rs
// We need to duplicate this here since build scripts can't access src/ modules
const AVAILABLE_VIEWS: &[&str] = &[
    "tree-json",
    "converted-treeviz",
    "graph-treeviz",
    "graph-json",
];

fn file_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .help(help)
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn schema_arg() -> Arg {
    Arg::new("schema")
        .long("schema")
        .short('s')
        .help("Schema XML declaring the node kinds")
        .value_hint(ValueHint::FilePath)
}

fn formatter_arg() -> Arg {
    Arg::new("formatter")
        .long("formatter")
        .short('f')
        .help("Formatter applied to emitted text")
        .value_parser(["none", "whitespace"])
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Output file path")
        .value_hint(ValueHint::FilePath)
}

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("nodesync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert between syntax trees and editable node graphs")
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a nodesync.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("forward")
                .arg(file_arg("input", "Tree JSON file"))
                .arg(schema_arg())
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("backward")
                .arg(file_arg("input", "Graph JSON file"))
                .arg(formatter_arg())
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("roundtrip")
                .arg(file_arg("input", "Tree JSON file"))
                .arg(schema_arg())
                .arg(formatter_arg())
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("inspect")
                .arg(file_arg("input", "Tree JSON file"))
                .arg(
                    Arg::new("view")
                        .help("View to render")
                        .value_parser(clap::builder::PossibleValuesParser::new(AVAILABLE_VIEWS))
                        .index(2)
                        .value_hint(ValueHint::Other),
                )
                .arg(schema_arg()),
        )
        .subcommand(
            Command::new("schema")
                .arg(schema_arg())
                .arg(Arg::new("filter").long("filter").value_hint(ValueHint::Other)),
        );

    // Generate completions for bash
    generate_to(Bash, &mut cmd, "nodesync", &outdir)?;

    // Generate completions for zsh
    generate_to(Zsh, &mut cmd, "nodesync", &outdir)?;

    // Generate completions for fish
    generate_to(Fish, &mut cmd, "nodesync", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}

//! Argument definitions

use clap::{value_parser, Arg, ArgAction, Command};

fn term_arg() -> Arg {
    Arg::new("term")
        .long("term")
        .required(true)
        .value_parser(value_parser!(u64))
        .help("Primary term identifier")
}

fn taxonomy_arg() -> Arg {
    Arg::new("taxonomy")
        .long("taxonomy")
        .help("Taxonomy of the term, required when the id is shared")
}

fn type_arg() -> Arg {
    Arg::new("type")
        .long("type")
        .help("Image type; the featured image if omitted")
}

/// Top-level command
#[must_use]
pub fn command() -> Command {
    Command::new("taxonomy-images")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and edit term image associations in a host snapshot")
        .subcommand_required(true)
        .arg(
            Arg::new("state")
                .long("state")
                .required(true)
                .help("Host snapshot (JSON); created if missing"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Configuration file (TOML)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .subcommand(Command::new("init").about("Persist empty association and settings records"))
        .subcommand(
            Command::new("get")
                .about("Print the image id associated with a term")
                .arg(term_arg())
                .arg(taxonomy_arg())
                .arg(type_arg()),
        )
        .subcommand(
            Command::new("set")
                .about("Associate an image with a term")
                .arg(term_arg())
                .arg(
                    Arg::new("image")
                        .long("image")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i64))
                        .help("Attachment id"),
                )
                .arg(taxonomy_arg())
                .arg(type_arg()),
        )
        .subcommand(
            Command::new("delete")
                .about("Remove a term's image")
                .arg(term_arg())
                .arg(taxonomy_arg())
                .arg(type_arg()),
        )
        .subcommand(
            Command::new("taxonomy")
                .about("Print the taxonomy of a term")
                .arg(term_arg()),
        )
        .subcommand(
            Command::new("settings")
                .about("Print or replace the taxonomies with image support")
                .arg(
                    Arg::new("enable")
                        .long("enable")
                        .value_delimiter(',')
                        .num_args(0..)
                        .help("Comma separated taxonomies; empty disables all"),
                ),
        )
        .subcommand(Command::new("legacy").about("Print the sanitized legacy association table"))
}

//! Command line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Build the `docsync` command
#[must_use]
pub fn build_cli() -> Command {
    Command::new("docsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keep onboarding plans in sync with repository documentation")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file (defaults to $DOCSYNC_CONFIG)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("is-doc")
                .about("Report whether paths are documentation files")
                .arg(
                    Arg::new("paths")
                        .required(true)
                        .num_args(1..)
                        .help("Repository-relative paths"),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Assess a documentation change against a step list")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .required(true)
                        .help("Path of the changed file, as shown to the oracle"),
                )
                .arg(
                    Arg::new("old")
                        .long("old")
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the previous content (empty when omitted)"),
                )
                .arg(
                    Arg::new("new")
                        .long("new")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the new content"),
                )
                .arg(
                    Arg::new("steps")
                        .long("steps")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of {title, instructions, kind?}"),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Process one changed file at one revision")
                .arg(store_arg())
                .arg(
                    Arg::new("repo")
                        .long("repo")
                        .required(true)
                        .help("Repository address tracked by sources"),
                )
                .arg(
                    Arg::new("file")
                        .long("file")
                        .required(true)
                        .help("Changed file path"),
                )
                .arg(
                    Arg::new("rev")
                        .long("rev")
                        .required(true)
                        .help("Revision the file changed at"),
                ),
        )
        .subcommand(
            Command::new("review")
                .about("List change records awaiting review, or close one")
                .arg(store_arg())
                .arg(
                    Arg::new("mark")
                        .long("mark")
                        .value_name("CHANGE_ID")
                        .help("Mark a change record reviewed"),
                ),
        )
}

fn store_arg() -> Arg {
    Arg::new("store")
        .long("store")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON store snapshot")
}

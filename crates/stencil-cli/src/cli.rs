//! Argument definitions

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Split `NAME=VALUE`
///
/// # Errors
/// When there is no `=` or the name is empty.
pub fn parse_assignment(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{text}'")),
    }
}

/// The `stencil` command line
#[must_use]
pub fn command() -> Command {
    Command::new("stencil")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Project templates with provenance and git-mediated upgrades")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("More logging; repeat for more"),
        )
        .subcommand(
            Command::new("create")
                .about("Create a project from a template")
                .arg(Arg::new("template").help("Template reference; lists templates when absent"))
                .arg(
                    Arg::new("params")
                        .value_name("PARAM=VALUE")
                        .num_args(0..)
                        .value_parser(parse_assignment)
                        .help("Template parameter values"),
                )
                .arg(
                    Arg::new("checkout")
                        .long("checkout")
                        .help("Branch, tag or commit to check out after cloning"),
                )
                .arg(
                    Arg::new("output-dir")
                        .short('o')
                        .long("output-dir")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory the project is created in"),
                )
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Overwrite existing files"),
                )
                .arg(
                    Arg::new("skip")
                        .short('s')
                        .long("skip")
                        .action(ArgAction::SetTrue)
                        .help("Keep existing files"),
                )
                .arg(
                    Arg::new("abbreviation")
                        .short('a')
                        .long("abbreviation")
                        .value_name("NAME=PATTERN")
                        .action(ArgAction::Append)
                        .value_parser(parse_assignment)
                        .help("Extra abbreviation for this run"),
                ),
        )
        .subcommand(
            Command::new("upgrade")
                .about("Re-apply the template of a generated project")
                .arg(
                    Arg::new("directory")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Generated project directory"),
                )
                .arg(
                    Arg::new("template")
                        .short('t')
                        .long("template")
                        .help("Template reference replacing the recorded one"),
                )
                .arg(
                    Arg::new("checkout")
                        .long("checkout")
                        .help("Branch, tag or commit to check out after cloning"),
                )
                .arg(
                    Arg::new("no-merge")
                        .short('n')
                        .long("no-merge")
                        .action(ArgAction::SetTrue)
                        .help("Commit to the template branch without merging"),
                )
                .arg(
                    Arg::new("ignore")
                        .short('i')
                        .long("ignore")
                        .action(ArgAction::Append)
                        .help("Pathspec whose template changes are discarded"),
                ),
        )
        .subcommand(Command::new("list").about("List abbreviations and registered templates"))
}

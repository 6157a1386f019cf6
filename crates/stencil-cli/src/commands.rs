//! Subcommand handlers
//!
//! Each handler returns the process exit status.

use crate::config::StencilConfig;
use crate::logging;
use clap::ArgMatches;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use stencil_template::{AbbreviationTable, CreateRequest, TemplateRegistry};
use stencil_upgrade::{UpgradeOrchestrator, UpgradeOutcome, UpgradeRequest};
use tracing::{error, info};

/// Run parsed arguments with a log sink scoped to this call
#[must_use]
pub fn run(matches: &ArgMatches) -> i32 {
    let verbosity = matches.get_count("verbose");
    tracing::subscriber::with_default(logging::subscriber(verbosity), || dispatch(matches))
}

fn dispatch(matches: &ArgMatches) -> i32 {
    let explicit = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let config = match StencilConfig::discover(explicit) {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            return 1;
        }
    };

    match matches.subcommand() {
        Some(("create", args)) => create(&config, args),
        Some(("upgrade", args)) => upgrade(&config, args),
        Some(("list", _)) => list(&config, &[]),
        _ => 2,
    }
}

fn create(config: &StencilConfig, args: &ArgMatches) -> i32 {
    let overrides: Vec<(String, String)> = args
        .get_many::<(String, String)>("abbreviation")
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    let Some(template) = args.get_one::<String>("template") else {
        return list(config, &overrides);
    };

    let output_dir = args
        .get_one::<PathBuf>("output-dir")
        .map_or_else(|| Path::new("."), PathBuf::as_path);
    let mut request = CreateRequest::new(template.as_str())
        .with_output_dir(output_dir)
        .with_policy_flags(args.get_flag("force"), args.get_flag("skip"));
    if let Some(checkout) = args.get_one::<String>("checkout") {
        request = request.with_checkout(checkout.as_str());
    }
    for (name, value) in args.get_many::<(String, String)>("params").into_iter().flatten() {
        request = request.with_parameter(name.as_str(), value.as_str());
    }

    let engine = config.engine(&overrides);
    println!("{}", announcement(engine.resolver().abbreviations(), template));
    match engine.create(&request) {
        Ok(project) => {
            info!(project = %project.display(), "project created");
            0
        }
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    }
}

/// Banner naming the template after abbreviation expansion
fn announcement(abbreviations: &AbbreviationTable, template: &str) -> String {
    format!("Generating project from '{}'\n", abbreviations.expand(template))
}

fn upgrade(config: &StencilConfig, args: &ArgMatches) -> i32 {
    let Some(directory) = args.get_one::<PathBuf>("directory") else {
        return 2;
    };
    let mut request = UpgradeRequest::new(directory)
        .with_merge(!args.get_flag("no-merge"))
        .with_ignore(args.get_many::<String>("ignore").into_iter().flatten().cloned());
    if let Some(template) = args.get_one::<String>("template") {
        request = request.with_template(template.as_str());
    }
    if let Some(checkout) = args.get_one::<String>("checkout") {
        request = request.with_checkout(checkout.as_str());
    }

    let engine = config.engine(&[]);
    match UpgradeOrchestrator::new(&engine).upgrade(&request) {
        Ok(UpgradeOutcome::NoChanges) => {
            println!("No changes found");
            0
        }
        Ok(UpgradeOutcome::Merged { branch }) => {
            info!(%branch, "template changes merged");
            0
        }
        Ok(UpgradeOutcome::Deferred { branch }) => {
            println!("Changes in branch '{branch}' not merged. Manual merge needed");
            0
        }
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    }
}

fn list(config: &StencilConfig, overrides: &[(String, String)]) -> i32 {
    let abbreviations = config.abbreviation_table(overrides);
    match write_listing(&mut io::stdout().lock(), &abbreviations, &config.templates) {
        Ok(()) => 0,
        Err(e) => {
            error!("cannot write listing: {e}");
            1
        }
    }
}

/// Print abbreviations and registered templates, both sorted and padded
///
/// # Errors
/// Write failures.
pub fn write_listing(
    out: &mut impl Write,
    abbreviations: &AbbreviationTable,
    registry: &TemplateRegistry,
) -> io::Result<()> {
    writeln!(out, "Available abbreviations:")?;
    let entries = abbreviations.sorted();
    let padding = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, pattern) in entries {
        writeln!(out, " - {name:<padding$}: {pattern}")?;
    }

    writeln!(out)?;
    writeln!(out, "Available templates:")?;
    if registry.is_empty() {
        return writeln!(out, "  <No registered templates>");
    }
    let entries = registry.sorted();
    let padding = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, descriptor) in entries {
        if descriptor.aliases.is_empty() {
            writeln!(out, " - {name:<padding$}: {}", descriptor.description)?;
        } else {
            writeln!(
                out,
                " - {name:<padding$}: {} (aliases: {})",
                descriptor.description,
                descriptor.aliases.join(", ")
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stencil_template::TemplateDescriptor;

    fn listing(abbreviations: &AbbreviationTable, registry: &TemplateRegistry) -> String {
        let mut out = Vec::new();
        write_listing(&mut out, abbreviations, registry).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn listing_pads_sorted_names() {
        let table = AbbreviationTable::new().merged([("gh", "https://github.com/{0}.git"), ("corp", "/srv/{0}")]);
        let mut registry = TemplateRegistry::new();
        registry.register("web", TemplateDescriptor::new("Web service", "gh:acme/web").with_aliases(["w"]));
        registry.register("cli", TemplateDescriptor::new("CLI tool", "/srv/cli"));

        assert_eq!(
            listing(&table, &registry),
            "Available abbreviations:\n\
             \x20- corp: /srv/{0}\n\
             \x20- gh  : https://github.com/{0}.git\n\
             \n\
             Available templates:\n\
             \x20- cli: CLI tool\n\
             \x20- web: Web service (aliases: w)\n"
        );
    }

    #[test]
    fn empty_registry_is_reported() {
        let text = listing(&AbbreviationTable::new(), &TemplateRegistry::new());
        assert!(text.ends_with("Available templates:\n  <No registered templates>\n"));
    }

    #[test]
    fn announcement_shows_expanded_reference() {
        let table = AbbreviationTable::new().merged([("corp", "https://git.example.com/{0}.git")]);

        assert_eq!(
            announcement(&table, "corp:web"),
            "Generating project from 'https://git.example.com/web.git'\n"
        );
        assert_eq!(announcement(&table, "./local"), "Generating project from './local'\n");
    }
}

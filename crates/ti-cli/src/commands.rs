//! Subcommand execution

use crate::state::StateFile;
use anyhow::Context as _;
use clap::ArgMatches;
use serde_json::json;
use std::sync::Arc;
use ti_core::{
    install, store::encode, Host, ImageType, InMemoryHost, RequestContext, TaxonomyImagesConfig, TermId,
    TermRef, WriteOutcome,
};

/// Result of one subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Text for stdout
    pub output: String,
    /// Host state changed and must be written back
    pub mutated: bool,
}

impl Outcome {
    fn read(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            mutated: false,
        }
    }

    fn write(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            mutated: true,
        }
    }
}

/// Run the parsed command line against the snapshot it names
///
/// # Errors
/// Returns error if the snapshot or configuration cannot be loaded or
/// saved, or the command itself fails
pub fn run(matches: &ArgMatches) -> anyhow::Result<String> {
    let state = matches
        .get_one::<String>("state")
        .map(StateFile::new)
        .context("--state is required")?;
    let config = match matches.get_one::<String>("config") {
        Some(path) => TaxonomyImagesConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => TaxonomyImagesConfig::default(),
    };

    let (name, args) = matches.subcommand().context("no command given")?;
    let host = state.load()?;
    let outcome = execute(&host, config, name, args)?;
    if outcome.mutated {
        state.save(&host)?;
    }
    Ok(outcome.output)
}

/// Run one subcommand against a host
///
/// # Errors
/// Returns error for an unknown command or a rejected write
pub fn execute(
    host: &Arc<InMemoryHost>,
    config: TaxonomyImagesConfig,
    name: &str,
    args: &ArgMatches,
) -> anyhow::Result<Outcome> {
    let dyn_host: Arc<dyn Host> = host.clone();

    if name == "init" {
        let created = install(&dyn_host, &config).context("install failed")?;
        return Ok(if created {
            Outcome::write("installed")
        } else {
            Outcome::read("already installed")
        });
    }

    let context = RequestContext::begin(dyn_host, config);
    tracing::debug!(command = name, backend = %context.backend(), "running command");
    let outcome = match name {
        "get" => {
            let term = term_ref(args)?;
            let id = context.images().get_image_id(&term, &image_type(args));
            Outcome::read(id.map_or_else(|| "none".to_string(), |id| id.to_string()))
        }
        "set" => {
            let term = term_ref(args)?;
            let image = *args.get_one::<i64>("image").context("--image is required")?;
            let written = context
                .images()
                .update_image_id(&term, image, &image_type(args))
                .with_context(|| format!("could not associate image {image} with {term}"))?;
            Outcome::write(match written {
                WriteOutcome::Created => "created",
                WriteOutcome::Updated => "updated",
            })
        }
        "delete" => {
            let term = term_ref(args)?;
            context
                .images()
                .delete_image(&term, &image_type(args))
                .with_context(|| format!("could not remove image from {term}"))?;
            Outcome::write("removed")
        }
        "taxonomy" => {
            let term = term_ref(args)?;
            Outcome::read(context.images().get_taxonomy(&term))
        }
        "settings" => settings(&context, args)?,
        "legacy" => {
            let table = encode(&context.legacy().refresh());
            Outcome::read(serde_json::to_string_pretty(&table)?)
        }
        other => anyhow::bail!("unknown command: {other}"),
    };
    context.end();
    Ok(outcome)
}

fn settings(context: &RequestContext, args: &ArgMatches) -> anyhow::Result<Outcome> {
    if !args.contains_id("enable") {
        let current = context.settings();
        return Ok(Outcome::read(serde_json::to_string(&current.taxonomies)?));
    }
    let taxonomies: Vec<&String> = args
        .get_many::<String>("enable")
        .into_iter()
        .flatten()
        .filter(|t| !t.trim().is_empty())
        .collect();
    let notice = context
        .save_settings(&json!({ "taxonomies": taxonomies }))
        .context("could not save settings")?;
    Ok(Outcome::write(notice.to_string()))
}

fn term_ref(args: &ArgMatches) -> anyhow::Result<TermRef> {
    let term = *args.get_one::<u64>("term").context("--term is required")?;
    let taxonomy = args.try_get_one::<String>("taxonomy").ok().flatten();
    Ok(TermRef::with_hint(TermId(term), taxonomy.map(String::as_str)))
}

fn image_type(args: &ArgMatches) -> ImageType {
    args.try_get_one::<String>("type")
        .ok()
        .flatten()
        .map_or_else(ImageType::featured, |t| ImageType::new(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command;
    use pretty_assertions::assert_eq;
    use ti_core::TermRegistry;

    fn host() -> Arc<InMemoryHost> {
        let host = Arc::new(InMemoryHost::new());
        host.register_taxonomy("category", "Categories", "Category");
        host.register_taxonomy("post_tag", "Tags", "Tag");
        host.insert_term(7, 42, "category", "News");
        host.insert_term(5, 50, "category", "Shared");
        host.insert_term(5, 51, "post_tag", "Shared");
        host
    }

    fn exec(host: &Arc<InMemoryHost>, argv: &[&str]) -> anyhow::Result<Outcome> {
        let mut full = vec!["taxonomy-images", "--state", "unused.json"];
        full.extend_from_slice(argv);
        let matches = command().try_get_matches_from(full)?;
        let (name, args) = matches.subcommand().context("no command")?;
        execute(host, TaxonomyImagesConfig::default(), name, args)
    }

    #[test]
    fn set_get_delete() {
        let host = host();
        assert_eq!(exec(&host, &["get", "--term", "7"]).unwrap().output, "none");
        assert_eq!(
            exec(&host, &["set", "--term", "7", "--image", "99"]).unwrap(),
            Outcome::write("created")
        );
        assert_eq!(exec(&host, &["set", "--term", "7", "--image", "100"]).unwrap().output, "updated");
        assert_eq!(exec(&host, &["get", "--term", "7"]).unwrap().output, "100");
        assert_eq!(exec(&host, &["delete", "--term", "7"]).unwrap().output, "removed");
        assert_eq!(exec(&host, &["get", "--term", "7"]).unwrap().output, "none");
    }

    #[test]
    fn negative_image_rejected() {
        let host = host();
        let err = exec(&host, &["set", "--term", "7", "--image", "-99"]).unwrap_err();
        assert!(err.to_string().contains("could not associate image -99"));
        assert_eq!(exec(&host, &["get", "--term", "7"]).unwrap().output, "none");
    }

    #[test]
    fn shared_term_needs_taxonomy() {
        let host = host();
        assert!(exec(&host, &["set", "--term", "5", "--image", "99"]).is_err());
        exec(&host, &["set", "--term", "5", "--image", "99", "--taxonomy", "post_tag"]).unwrap();
        assert_eq!(
            exec(&host, &["get", "--term", "5", "--taxonomy", "post_tag"]).unwrap().output,
            "99"
        );
        assert_eq!(exec(&host, &["taxonomy", "--term", "7"]).unwrap().output, "category");
        assert_eq!(exec(&host, &["taxonomy", "--term", "404"]).unwrap().output, "");
    }

    #[test]
    fn legacy_table_mirrors_writes() {
        let host = host();
        exec(&host, &["set", "--term", "7", "--image", "99"]).unwrap();
        let table: serde_json::Value =
            serde_json::from_str(&exec(&host, &["legacy"]).unwrap().output).unwrap();
        assert_eq!(table, json!({"42": 99}));
    }

    #[test]
    fn settings_print_and_replace() {
        let host = host();
        assert_eq!(exec(&host, &["settings"]).unwrap(), Outcome::read("[]"));

        let saved = exec(&host, &["settings", "--enable", "category,bogus"]).unwrap();
        assert_eq!(saved, Outcome::write("Image support for taxonomies successfully updated"));
        assert_eq!(exec(&host, &["settings"]).unwrap().output, "[\"category\"]");

        let disabled = exec(&host, &["settings", "--enable", ""]).unwrap();
        assert_eq!(disabled.output, "Image support has been disabled for all taxonomies.");
    }

    #[test]
    fn init_is_idempotent() {
        let host = host();
        assert_eq!(exec(&host, &["init"]).unwrap(), Outcome::write("installed"));
        assert_eq!(exec(&host, &["init"]).unwrap(), Outcome::read("already installed"));
        assert_eq!(host.taxonomies().len(), 2);
    }
}

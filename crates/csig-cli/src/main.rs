mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command};
use csig_rules::{transform, transform_enveloped, RuleCatalog};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn load_catalog(path: &Path) -> Result<RuleCatalog> {
    RuleCatalog::from_path(path).with_context(|| format!("loading catalog {}", path.display()))
}

fn run(catalog: &Path, rule_id: &str, fixture: &Path, envelope: bool) -> Result<Value> {
    let catalog = load_catalog(catalog)?;
    let rule = catalog.require(rule_id)?;
    let text = fs::read_to_string(fixture)
        .with_context(|| format!("reading fixture {}", fixture.display()))?;

    info!(rule = rule_id, fixture = %fixture.display(), "running rule");
    Ok(if envelope {
        transform_enveloped(rule, text).into_value()
    } else {
        transform(rule, text)
    })
}

fn list(catalog: &Path) -> Result<Value> {
    let catalog = load_catalog(catalog)?;
    let mut rules = Vec::with_capacity(catalog.len());
    for rule in &catalog.rules {
        let check = serde_json::to_value(&rule.check)?;
        rules.push(json!({
            "id": rule.id,
            "criteriaKey": rule.criteria_key,
            "kind": check["kind"],
            "missingData": rule.missing_data,
            "description": rule.description,
        }));
    }
    Ok(json!({ "name": catalog.name, "version": catalog.version, "rules": rules }))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if args.verbose {
        EnvFilter::new("csig=debug")
    } else {
        EnvFilter::new("csig=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", args.verbose);

    let output = match &args.command {
        Command::Run {
            catalog,
            rule,
            fixture,
            envelope,
        } => run(catalog, rule, fixture, *envelope)?,
        Command::List { catalog } => list(catalog)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use form_spec::{FormDefinition, definition_schema, payload_schema};
use formdeck_store::RepositoryError;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::app::App;
use crate::cli::Output;

#[derive(Subcommand, Debug, Clone)]
pub enum FormsCommand {
    /// List every form definition
    List,
    /// Show one form definition with its fields in render order
    Show(FormIdArgs),
    /// Print the JSON schema of a form's payload, or of definitions themselves
    Schema(SchemaArgs),
    /// Delete a form definition
    Delete(FormIdArgs),
    /// Create or replace a form definition from a JSON file
    Import(ImportArgs),
    /// Write a form definition as JSON
    Export(ExportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FormIdArgs {
    /// Form definition id
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Form definition id; omit to print the schema of definitions
    pub id: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(value_name = "FILE")]
    pub path: PathBuf,
    /// Replace an existing definition with the same id
    #[arg(long)]
    pub replace: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    pub id: String,
    /// Write to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Serialize)]
struct FormSummary<'a> {
    id: &'a str,
    name: &'a str,
    table_name: &'a str,
    fields: usize,
    is_system: bool,
}

pub async fn run(app: &App, command: FormsCommand, out: Output) -> Result<()> {
    match command {
        FormsCommand::List => list(app, out).await,
        FormsCommand::Show(args) => show(app, &args.id, out).await,
        FormsCommand::Schema(args) => schema(app, args.id.as_deref()).await,
        FormsCommand::Delete(args) => {
            app.forms
                .delete(&args.id)
                .await
                .with_context(|| format!("failed to delete form '{}'", args.id))?;
            if out.json {
                super::print_json(&json!({ "deleted": args.id }))
            } else {
                println!("deleted {}", args.id);
                Ok(())
            }
        }
        FormsCommand::Import(args) => import(app, args, out).await,
        FormsCommand::Export(args) => export(app, args).await,
    }
}

async fn list(app: &App, out: Output) -> Result<()> {
    let forms = app.forms.list().await.context("failed to list forms")?;
    let summaries = forms
        .iter()
        .map(|form| FormSummary {
            id: &form.id,
            name: &form.name,
            table_name: &form.table_name,
            fields: form.fields.len(),
            is_system: form.is_system,
        })
        .collect::<Vec<_>>();
    if out.json {
        return super::print_json(&summaries);
    }
    if summaries.is_empty() {
        println!("no forms defined; run `formdeck seed` to add the defaults");
    }
    for form in summaries {
        let system = if form.is_system { " [system]" } else { "" };
        println!(
            "{:<24} {:<28} table={} fields={}{}",
            form.id, form.name, form.table_name, form.fields, system
        );
    }
    Ok(())
}

async fn show(app: &App, id: &str, out: Output) -> Result<()> {
    let form = app.form(id).await?;
    if out.json {
        return super::print_json(&form);
    }
    println!("{} ({})", form.name, form.id);
    if let Some(description) = &form.description {
        println!("{description}");
    }
    println!("table: {}", form.table_name);
    for field in form.ordered_fields() {
        let mut flags = Vec::new();
        if field.required {
            flags.push("required");
        }
        if field.is_system {
            flags.push("system");
        }
        if field.has_data {
            flags.push("has data");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        println!(
            "  {:>3}  {:<20} {:<9} -> {}{}",
            field.order,
            field.id,
            field.kind.as_str(),
            field.db_field,
            flags
        );
    }
    Ok(())
}

async fn schema(app: &App, id: Option<&str>) -> Result<()> {
    let schema = match id {
        Some(id) => payload_schema(&app.form(id).await?),
        None => definition_schema(),
    };
    super::print_json(&schema)
}

async fn import(app: &App, args: ImportArgs, out: Output) -> Result<()> {
    let definition: FormDefinition = super::read_json(&args.path)?;
    let id = definition.id.clone();
    let stored = match app.forms.create(definition.clone()).await {
        Ok(stored) => stored,
        Err(RepositoryError::Store(err)) if err.is_conflict() && args.replace => {
            info!(form = %id, "replacing existing form definition");
            app.forms.save(definition).await?
        }
        Err(RepositoryError::Store(err)) if err.is_conflict() => {
            anyhow::bail!("form '{id}' already exists; pass --replace to overwrite it")
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to import {}", args.path.display()));
        }
    };
    if out.json {
        super::print_json(&stored)
    } else {
        println!("imported {} ({} fields)", stored.id, stored.fields.len());
        Ok(())
    }
}

async fn export(app: &App, args: ExportArgs) -> Result<()> {
    let form = app.form(&args.id).await?;
    let raw = serde_json::to_string_pretty(&form)?;
    match &args.out {
        Some(path) => std::fs::write(path, format!("{raw}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{raw}");
            Ok(())
        }
    }
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use form_spec::{FieldSchema, FormDefinition};

use crate::app::App;
use crate::cli::Output;

#[derive(Subcommand, Debug, Clone)]
pub enum FieldCommand {
    /// Add a field described by a JSON file
    Add(AddArgs),
    /// Replace a field with the JSON description in a file
    Update(UpdateArgs),
    /// Remove a field that is neither system-owned nor holding data
    Remove(FieldArgs),
    /// Change a field's sort key
    Move(MoveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    pub form: String,
    #[arg(value_name = "FIELD_JSON")]
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    pub form: String,
    pub field: String,
    #[arg(value_name = "FIELD_JSON")]
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct FieldArgs {
    pub form: String,
    pub field: String,
}

#[derive(Args, Debug, Clone)]
pub struct MoveArgs {
    pub form: String,
    pub field: String,
    #[arg(allow_negative_numbers = true)]
    pub order: i32,
}

pub async fn run(app: &App, command: FieldCommand, out: Output) -> Result<()> {
    let (form_id, action) = match &command {
        FieldCommand::Add(args) => (args.form.clone(), "added"),
        FieldCommand::Update(args) => (args.form.clone(), "updated"),
        FieldCommand::Remove(args) => (args.form.clone(), "removed"),
        FieldCommand::Move(args) => (args.form.clone(), "moved"),
    };
    let mut form = app.form(&form_id).await?;
    app.forms
        .refresh_has_data(&mut form)
        .await
        .with_context(|| format!("failed to inspect table '{}'", form.table_name))?;

    let field_id = apply(&mut form, command)?;
    let saved = app
        .forms
        .save(form)
        .await
        .with_context(|| format!("failed to save form '{form_id}'"))?;

    if out.json {
        return super::print_json(&saved);
    }
    println!("{action} field {field_id} on {}", saved.id);
    Ok(())
}

fn apply(form: &mut FormDefinition, command: FieldCommand) -> Result<String> {
    let field_id = match command {
        FieldCommand::Add(args) => {
            let field: FieldSchema = super::read_json(&args.path)?;
            let id = field.id.clone();
            form.add_field(field)?;
            id
        }
        FieldCommand::Update(args) => {
            let field: FieldSchema = super::read_json(&args.path)?;
            form.update_field(&args.field, field)?;
            args.field
        }
        FieldCommand::Remove(args) => {
            form.remove_field(&args.field)?;
            args.field
        }
        FieldCommand::Move(args) => {
            form.move_field(&args.field, args.order)?;
            args.field
        }
    };
    Ok(field_id)
}

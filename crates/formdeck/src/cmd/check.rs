use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use serde_json::json;

use crate::app::App;
use crate::cli::Output;

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Form definition id
    pub form: String,
    /// JSON object of field id -> value
    #[arg(long, value_name = "FILE")]
    pub values: PathBuf,
}

pub async fn run(app: &App, args: CheckArgs, out: Output) -> Result<()> {
    let mut session =
        super::values::prepare_session(app, &args.form, &args.values, None).await?;
    let plan = session.plan_submit()?;

    if out.json {
        super::print_json(&json!({
            "form": plan.form_id,
            "table": plan.table_name,
            "valid": plan.is_valid(),
            "errors": plan.errors,
            "payload": plan.payload,
        }))?;
    } else if plan.is_valid() {
        println!(
            "{}: valid, {} column(s) for table {}",
            plan.form_id,
            plan.payload.len(),
            plan.table_name
        );
    } else {
        for (field_id, message) in &plan.errors {
            println!("{field_id}: {message}");
        }
    }

    if !plan.is_valid() {
        bail!("{} field(s) failed validation", plan.errors.len());
    }
    Ok(())
}

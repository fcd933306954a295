use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use form_spec::SubmitOutcome;
use serde_json::json;

use crate::app::App;
use crate::cli::Output;

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Form definition id
    pub form: String,
    /// JSON object of field id -> value
    #[arg(long, value_name = "FILE")]
    pub values: PathBuf,
    /// Update this record instead of inserting a new one
    #[arg(long, value_name = "ID")]
    pub record: Option<String>,
}

pub async fn run(app: &App, args: SubmitArgs, out: Output) -> Result<()> {
    let mut session = super::values::prepare_session(
        app,
        &args.form,
        &args.values,
        args.record.as_deref(),
    )
    .await?;
    let adapter = app.adapter();

    match session.submit(&adapter).await? {
        SubmitOutcome::Submitted(record) => {
            if out.json {
                super::print_json(&record)
            } else {
                let id = record.get("id").and_then(|id| id.as_str()).unwrap_or_default();
                println!("saved {} record {}", session.definition().table_name, id);
                Ok(())
            }
        }
        SubmitOutcome::Invalid(errors) => {
            if out.json {
                super::print_json(&json!({ "errors": errors }))?;
            } else {
                for (field_id, message) in &errors {
                    println!("{field_id}: {message}");
                }
            }
            bail!("{} field(s) failed validation", errors.len())
        }
        SubmitOutcome::Failed(err) => {
            let message = session.failure_message().unwrap_or_default().to_string();
            match &err.hint {
                Some(hint) => bail!("{message} ({}; {hint})", err.message),
                None => bail!("{message} ({})", err.message),
            }
        }
        SubmitOutcome::Ignored => bail!("a submission is already in progress"),
    }
}

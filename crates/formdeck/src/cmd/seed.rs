use anyhow::{Context, Result};
use serde_json::json;

use crate::app::App;
use crate::cli::Output;

pub async fn run(app: &App, out: Output) -> Result<()> {
    let inserted = app
        .forms
        .ensure_defaults()
        .await
        .context("failed to seed default forms")?;
    if out.json {
        return super::print_json(&json!({ "inserted": inserted }));
    }
    if inserted.is_empty() {
        println!("default forms already present");
    } else {
        for id in &inserted {
            println!("seeded {id}");
        }
    }
    Ok(())
}

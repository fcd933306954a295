use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Args, Subcommand};

use crate::app::App;
use crate::cli::Output;

#[derive(Subcommand, Debug, Clone)]
pub enum DocsCommand {
    /// Upload a file into the document library
    Upload(UploadArgs),
    /// List uploaded documents, newest first
    List,
    /// Remove a document and its stored file
    Remove(RemoveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    pub path: PathBuf,
    /// Name to store the document under; defaults to the file name
    #[arg(long)]
    pub name: Option<String>,
    /// Content type; guessed from the extension when omitted
    #[arg(long = "content-type")]
    pub content_type: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RemoveArgs {
    pub id: String,
}

pub async fn run(app: &App, command: DocsCommand, out: Output) -> Result<()> {
    let library = app.documents();
    match command {
        DocsCommand::Upload(args) => {
            let bytes = tokio::fs::read(&args.path)
                .await
                .with_context(|| format!("failed to read {}", args.path.display()))?;
            let name = match args.name {
                Some(name) => name,
                None => args
                    .path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("{} has no usable file name", args.path.display()))?,
            };
            let content_type = args
                .content_type
                .or_else(|| super::values::content_type(&args.path));
            let document = library
                .upload(&name, content_type, Bytes::from(bytes))
                .await
                .with_context(|| format!("failed to upload {}", args.path.display()))?;
            if out.json {
                super::print_json(&document)
            } else {
                println!("uploaded {} as {}", document.name, document.id);
                println!("{}", document.url);
                Ok(())
            }
        }
        DocsCommand::List => {
            let documents = library.list().await.context("failed to list documents")?;
            if out.json {
                return super::print_json(&documents);
            }
            for document in documents {
                println!(
                    "{}  {:<32} {:>10}  {}",
                    document.id, document.name, document.size, document.uploaded_at
                );
            }
            Ok(())
        }
        DocsCommand::Remove(args) => {
            let document = library
                .remove(&args.id)
                .await
                .with_context(|| format!("failed to remove document '{}'", args.id))?;
            if out.json {
                super::print_json(&document)
            } else {
                println!("removed {} ({})", document.id, document.name);
                Ok(())
            }
        }
    }
}

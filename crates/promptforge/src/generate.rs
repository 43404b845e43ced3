use crate::completion::{CompletionClient, CompletionOptions, HttpCompletionClient};
use crate::error::blocking;
use crate::prelude::{eprintln, println, *};
use crate::store::{FsProjectStore, ProjectStore};
use promptforge_core::blocks::{leading_text, GeneratedFileSet};
use promptforge_core::manifest::RequiredFileManifest;
use promptforge_core::paths::route_generated;
use promptforge_core::prompt::{generation_system_prompt, preview};
use promptforge_core::session::{AttemptOutcome, RetrySession, Step, DEFAULT_MAX_RETRIES};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Where projects live and how hard to try.
#[derive(Debug, Clone, clap::Args)]
pub struct ProjectOptions {
    /// Base directory holding the `public` and `src` subtrees
    #[clap(long, env = "PROMPTFORGE_PROJECTS_DIR", default_value = "projects")]
    pub projects_dir: PathBuf,

    /// Retries after the first attempt when required files are missing
    #[clap(long, env = "PROMPTFORGE_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: usize,
}

#[derive(Debug, clap::Parser)]
#[command(name = "generate")]
#[command(about = "Generate a project from a description and write it to disk")]
pub struct GenerateOptions {
    /// Description of the application to build
    pub prompt: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[clap(flatten)]
    pub project: ProjectOptions,

    #[clap(flatten)]
    pub completion: CompletionOptions,
}

/// Response of a successful generation.
#[derive(Debug, Serialize)]
pub struct GenerationOutput {
    pub message: String,
    pub files: GeneratedFileSet,
    pub text_response: String,
}

/// Drive the generation loop until the model returns every required file.
///
/// Completion failures and incomplete answers share the retry budget. Files
/// are written one by one, on the blocking pool, once a complete set arrives;
/// a failed write aborts the request and leaves earlier writes on disk.
pub async fn generate_project(
    client: &dyn CompletionClient,
    store: Arc<dyn ProjectStore>,
    prompt: &str,
    max_retries: usize,
) -> Result<GenerationOutput, Error> {
    let manifest = RequiredFileManifest::default();
    let system_prompt = generation_system_prompt();
    let mut session = RetrySession::new(prompt, max_retries);

    loop {
        log::info!(
            "Attempt {} of {}",
            session.attempt() + 1,
            session.max_attempts()
        );

        let (outcome, text) = match client.complete(&system_prompt, session.prompt()).await {
            Ok(text) => (AttemptOutcome::Completed(text.clone()), Some(text)),
            Err(err) => {
                log::error!(
                    "Error in generation attempt {}: {err}",
                    session.attempt() + 1
                );
                (AttemptOutcome::Failed(err), None)
            }
        };

        match session.step(outcome, &manifest) {
            Step::Persist(files) => {
                let store = Arc::clone(&store);
                let files = blocking(move || persist(store.as_ref(), files)).await?;
                return Ok(GenerationOutput {
                    message: "Files generated".to_string(),
                    text_response: leading_text(text.as_deref().unwrap_or_default()),
                    files,
                });
            }
            Step::Retry(next) => {
                if !next.missing().is_empty() && next.last_failure().is_none() {
                    log::warn!("Missing files: {}", next.missing().join(", "));
                }
                session = next;
            }
            Step::Fail(err) => {
                if let Some(text) = &text {
                    log::error!("Giving up on response: {}", preview(text, 500));
                }
                return Err(err.into());
            }
        }
    }
}

fn persist(
    store: &dyn ProjectStore,
    files: GeneratedFileSet,
) -> Result<GeneratedFileSet, Error> {
    for file in &files {
        store
            .write_generated(&file.path, &file.content)
            .map_err(|source| Error::Persist {
                path: file.path.clone(),
                source,
            })?;
        log::info!("Parsed file: {}", file.path);
    }
    Ok(files)
}

/// CLI entry point.
pub async fn run(options: GenerateOptions, global: crate::Global) -> Result<()> {
    let client = HttpCompletionClient::new(&options.completion)
        .context("Failed to create completion client")?;
    let store = Arc::new(
        FsProjectStore::setup(&options.project.projects_dir)
            .context("Failed to set up project directory")?,
    );

    if global.verbose {
        eprintln!("Model: {}", client.model_name());
        eprintln!("Projects dir: {}", store.root().display());
        eprintln!("Max retries: {}", options.project.max_retries);
    }

    let output = generate_project(
        &client,
        store.clone(),
        &options.prompt,
        options.project.max_retries,
    )
    .await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}\n", output.text_response);

    let mut table = new_table(&["FILE", "STORED AT", "BYTES"]);
    for file in &output.files {
        let stored_at = route_generated(&file.path)
            .map(|routed| routed.subtree.logical_path(&routed.relative))
            .unwrap_or_else(|_| file.path.clone());
        table.add_row(prettytable::row![file.path, stored_at, file.content.len()]);
    }
    table.printstd();

    Ok(())
}

mod cli;

use assetforge::{app::build_app, config};

use af_job::{App, Job, Recipe};
use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use cli::{Cli, Commands, StepSpec};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "assetforge=trace,af_job=trace".to_string()
        } else {
            "assetforge=info,af_job=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Store { file } => block_on(store_file(&file, config_path)),
        Commands::Run {
            uid,
            process,
            encode,
            recipe,
            output,
        } => block_on(run_job(
            config_path,
            uid,
            recipe.as_deref(),
            process,
            encode,
            &output,
        )),
        Commands::Analyse { uid, name, process } => {
            block_on(analyse(config_path, uid, &name, process))
        }
        Commands::Recipe {
            uid,
            process,
            encode,
        } => print_recipe(config_path, uid, process, encode),
        Commands::Destroy { uid } => block_on(destroy(config_path, &uid)),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("assetforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}

fn load_app(config_path: Option<&Path>) -> Result<Arc<App>> {
    let config = config::load_config_or_default(config_path)?;
    build_app(&config)
}

/// Assemble a job from an optional fetch, recipe and command-line steps, in
/// that order.
fn build_job(
    app: &Arc<App>,
    uid: Option<String>,
    recipe: Option<Recipe>,
    process: Vec<StepSpec>,
    encode: Option<StepSpec>,
) -> Job {
    let mut job = app.new_job();
    if let Some(uid) = uid {
        job.push_fetch(uid);
    }
    if let Some(recipe) = recipe {
        for step in recipe.into_steps() {
            job.push_step(step);
        }
    }
    for step in process {
        job.push_process(step.name, step.params);
    }
    if let Some(step) = encode {
        job.push_encode(step.name, step.params);
    }
    job
}

async fn store_file(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let app = load_app(config_path)?;
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))?;
    let uid = app.datastore().store(Bytes::from(data)).await?;
    println!("{}", uid);
    Ok(())
}

async fn run_job(
    config_path: Option<&Path>,
    uid: Option<String>,
    recipe_path: Option<&Path>,
    process: Vec<StepSpec>,
    encode: Option<StepSpec>,
    output: &Path,
) -> Result<()> {
    let app = load_app(config_path)?;

    let recipe = match recipe_path {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read recipe: {:?}", path))?;
            Some(
                Recipe::from_json(&json)
                    .with_context(|| format!("Failed to parse recipe: {:?}", path))?,
            )
        }
        None => None,
    };

    let mut job = build_job(&app, uid, recipe, process, encode);
    if job.num_steps() == 0 {
        anyhow::bail!("Nothing to run: give a uid, a recipe or at least one step");
    }

    tracing::info!("Running job: {}", job);
    let artifact = job.artifact().await?;
    artifact
        .to_file(output)
        .await
        .with_context(|| format!("Failed to write {:?}", output))?;

    println!("Wrote {} bytes to {}", artifact.len(), output.display());
    Ok(())
}

async fn analyse(
    config_path: Option<&Path>,
    uid: String,
    name: &str,
    process: Vec<StepSpec>,
) -> Result<()> {
    let app = load_app(config_path)?;
    let mut job = build_job(&app, Some(uid), None, process, None);
    let value = job.analyse(name, &[]).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_recipe(
    config_path: Option<&Path>,
    uid: String,
    process: Vec<StepSpec>,
    encode: Option<StepSpec>,
) -> Result<()> {
    let app = load_app(config_path)?;
    let job = build_job(&app, Some(uid), None, process, encode);
    let recipe = job.recipe();
    let out = serde_json::json!({
        "signature": recipe.signature(),
        "steps": recipe,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn destroy(config_path: Option<&Path>, uid: &str) -> Result<()> {
    let app = load_app(config_path)?;
    app.datastore().destroy(uid).await?;
    println!("Destroyed {}", uid);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Datastore: {}", config.datastore.backend);
    if config.datastore.backend == config::DatastoreBackend::File {
        println!("  Root: {}", config::datastore_root(&config.datastore)?.display());
    }
    println!("  JPEG quality: {}", config.imaging.jpeg_quality);
    println!("  Max dimension: {}", config.imaging.max_dimension);

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("  Warnings:");
        for warning in warnings {
            println!("    - {}", warning);
        }
    }

    Ok(())
}

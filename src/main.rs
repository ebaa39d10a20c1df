use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use gallery_images::application::GalleryContext;
use gallery_images::domain::ImageReference;
use gallery_images::domain::entities::UserPreferences;
use gallery_images::infrastructure::config::{
    Command, EnvironmentArgs, FetchArgs, PlanArgs, PrefsCommand,
};
use gallery_images::infrastructure::{
    AppConfig, CliArgs, HttpImageFetcher, SnapshotEnvironment, StorageManager,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn environment(args: &EnvironmentArgs) -> Result<SnapshotEnvironment> {
    if let Some(path) = &args.env_file {
        return Ok(SnapshotEnvironment::from_file(path)?);
    }
    Ok(args
        .to_snapshot()
        .map_or_else(SnapshotEnvironment::server, SnapshotEnvironment::browser))
}

fn create_context(
    config: &AppConfig,
    storage: &StorageManager,
    env: &EnvironmentArgs,
) -> Result<GalleryContext> {
    let source = Arc::new(environment(env)?);
    let mut fetcher = HttpImageFetcher::new(config.images.timeout())?;
    if let Some(base_url) = &config.cdn.base_url {
        fetcher = fetcher.with_base_url(base_url)?;
    }
    if let Some(root) = &config.images.local_root {
        fetcher = fetcher.with_local_root(root.clone());
    }
    let fetcher = Arc::new(fetcher);
    let preferences = storage.load_preferences()?;

    Ok(GalleryContext::new(
        config.clone(),
        source,
        fetcher,
        preferences,
    ))
}

fn run_plan(config: &AppConfig, storage: &StorageManager, args: &PlanArgs) -> Result<()> {
    let context = create_context(config, storage, &args.environment)?;

    let mut reference = ImageReference::new(args.url.clone());
    if let Some(id) = &args.cloudinary_id {
        reference = reference.with_cloudinary_id(id.clone());
    }

    let plan = context.plan(&reference, args.container_width);
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

async fn run_fetch(config: &AppConfig, storage: &StorageManager, args: &FetchArgs) -> Result<()> {
    let context = create_context(config, storage, &args.environment)?;

    let urls: Vec<String> = if args.raw {
        args.urls.clone()
    } else {
        args.urls
            .iter()
            .map(|url| {
                context
                    .resolve(&ImageReference::new(url.clone()), args.container_width)
                    .url
            })
            .collect()
    };

    info!(count = urls.len(), "Fetching images");
    let results = context.loader().load_many(&urls).await;

    let images: Vec<_> = urls
        .iter()
        .zip(results)
        .map(|(url, result)| match result {
            Ok(loaded) => json!({
                "url": url,
                "source": format!("{:?}", loaded.source),
                "width": loaded.entry.width,
                "height": loaded.entry.height,
            }),
            Err(e) => json!({ "url": url, "error": e.to_string() }),
        })
        .collect();

    let report = json!({
        "images": images,
        "cache": context.cache().stats(),
        "metrics": context.metrics(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_prefs(storage: &StorageManager, command: PrefsCommand) -> Result<()> {
    let mut prefs = storage.load_preferences()?;

    if let PrefsCommand::Set {
        theme,
        enable_animations,
        reduce_motion,
        data_saver,
    } = command
    {
        prefs = UserPreferences {
            theme: theme.unwrap_or(prefs.theme),
            enable_animations: enable_animations.unwrap_or(prefs.enable_animations),
            reduce_motion: reduce_motion.unwrap_or(prefs.reduce_motion),
            data_saver: data_saver.unwrap_or(prefs.data_saver),
        };
        storage.save_preferences(&prefs)?;
        info!(dir = %storage.config_dir().display(), "Preferences saved");
    }

    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(&args);
    config.apply_env();

    init_logging(&config)?;
    info!(version = gallery_images::VERSION, "Starting {}", gallery_images::NAME);

    match args.command {
        Command::Plan(plan) => run_plan(&config, &storage, &plan),
        Command::Fetch(fetch) => run_fetch(&config, &storage, &fetch).await,
        Command::Prefs(prefs) => run_prefs(&storage, prefs),
    }
}

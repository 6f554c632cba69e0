//! dataregistry - resolve URLs into every mimetype your converters can reach.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use dataregistry::{
    Registry,
    builtin::{create_file_url, create_folder_url, standard_converters},
    config::RegistryConfig,
    data::{Data, Dataset},
    log,
    stream::{Notification, Observer, ValueStream},
};
use std::path::Path;
use tokio::{runtime::Handle, sync::mpsc};

type PrintReceiver = mpsc::UnboundedReceiver<Notification<String>>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let (print_tx, print_rx) = mpsc::unbounded_channel();
    let print_sink = Observer::new(move |notification| {
        print_tx.send(notification).ok();
    });
    let registry = build_registry(&cli, &config, runtime.handle().clone(), print_sink);

    runtime.block_on(run(&cli, &registry, print_rx))
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<RegistryConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let config = RegistryConfig::load_or_default(&config_path)?;
    config.validate()?;
    Ok(config)
}

/// Registry with the standard converters, the configured extensions and the
/// configured datasets.
fn build_registry(
    cli: &Cli,
    config: &RegistryConfig,
    handle: Handle,
    print_sink: Observer<String>,
) -> Registry {
    let mut options = config.registry_options();
    options.verbose |= cli.verbose;

    let registry = Registry::with_options(options);
    registry.add_converters(standard_converters(handle, config.stream.error, print_sink));
    registry.add_converters(config.converters());

    let datasets = config.datasets();
    if !datasets.is_empty() {
        registry.add_datasets(datasets);
    }
    registry
}

async fn run(cli: &Cli, registry: &Registry, print_rx: PrintReceiver) -> Result<()> {
    let url = cli.command.url().map(|url| normalize_url(cli, url)).transpose()?;
    let url = url.as_deref().unwrap_or_default();

    match &cli.command {
        Commands::Resolve { .. } => {
            let dataset = registry.get_url(url)?;
            for (mime_type, value) in dataset.iter() {
                println!("{:>4}  {mime_type}  ({})", value.cost, value.data.type_name());
            }
            if registry.options().verbose {
                log!("resolve"; "{} mimetypes for `{url}`", dataset.len());
            }
        }
        Commands::Urls => {
            for url in registry.urls() {
                println!("{url}");
            }
        }
        Commands::Show { mime_type, .. } => {
            let dataset = registry.get_url(url)?;
            let text = show(&dataset, url, mime_type.as_deref()).await?;
            println!("{text}");
        }
        Commands::Labels { .. } => {
            for label in registry.labels(url)? {
                println!("{label}");
            }
        }
        Commands::View { label, .. } => {
            let subscription = registry.view(url, label)?;
            wait_for_view(print_rx).await?;
            subscription.unsubscribe();
        }
    }

    Ok(())
}

/// Accept URLs as given, turn anything else into a `file:` URL under the root.
fn normalize_url(cli: &Cli, input: &str) -> Result<String> {
    if url::Url::parse(input).is_ok() {
        return Ok(input.to_owned());
    }

    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let path = std::path::absolute(root.join(input))
        .with_context(|| format!("failed to resolve path `{input}`"))?;
    let url = if path.is_dir() {
        create_folder_url(&path)
    } else {
        create_file_url(&path)
    };
    match url {
        Some(url) => Ok(url),
        None => bail!("`{}` cannot be expressed as a file URL", path.display()),
    }
}

/// Text stored under `mime_type`, or under the cheapest non-internal text
/// entry when no mimetype is given.
async fn show(dataset: &Dataset, url: &str, mime_type: Option<&str>) -> Result<String> {
    let (mime_type, data) = match mime_type {
        Some(mime_type) => match dataset.data(mime_type) {
            Some(data) => (mime_type, data),
            None => bail!("`{url}` does not resolve to `{mime_type}`"),
        },
        None => {
            let cheapest = dataset
                .iter()
                .filter(|(mime_type, value)| !is_internal(mime_type) && is_text(&value.data))
                .min_by_key(|(_, value)| value.cost);
            match cheapest {
                Some((mime_type, value)) => (mime_type, &value.data),
                None => bail!("`{url}` has no text entry"),
            }
        }
    };

    if let Some(stream) = data.get::<ValueStream<String>>() {
        return Ok(stream.first().await?);
    }
    if let Some(text) = data.get::<String>() {
        return Ok(text);
    }
    bail!("`{mime_type}` holds `{}`, not text", data.type_name())
}

fn is_internal(mime_type: &str) -> bool {
    mime_type.starts_with("application/x.jupyter")
}

fn is_text(data: &Data) -> bool {
    data.is::<ValueStream<String>>() || data.is::<String>()
}

/// Print what the view emits until it completes.
async fn wait_for_view(mut print_rx: PrintReceiver) -> Result<()> {
    while let Some(notification) = print_rx.recv().await {
        match notification {
            Notification::Next(text) => println!("{text}"),
            Notification::Error(err) => bail!(err),
            Notification::Complete => return Ok(()),
        }
    }
    Ok(())
}

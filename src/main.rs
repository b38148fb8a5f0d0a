use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use companion_core::catalog::{Character, CoinPackage, Coupon, Listing, ShopItem, WheelReward};
use companion_core::config::{self, AppConfig, PagingConfig};
use companion_core::imaging::{
    ImageAsset, LocalLoader, PipelineConfig, RustBackend, SourceFile, UploadError,
    blur_placeholder, prepare_batch,
};
use companion_core::output::{self, WrittenFiles};
use companion_core::paging::{LoadOutcome, PagedListSync};
use companion_core::store::InMemoryCollection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "companion")]
#[command(about = "Image normalization and paged catalog browsing for the game companion")]
#[command(long_about = "\
Image normalization and paged catalog browsing for the game companion

Uploads are normalized into three artifacts before they are stored:

  hero.jpg
  ├── hero-<hash>.jpg         # Bounded full-size image (images.max_edge)
  ├── hero-<hash>-thumb.jpg   # Center-cropped square (thumbnails.edge)
  └── placeholder             # Tiny blurred data URI, kept in manifest.json

Catalog exports (JSON arrays of rows) can be browsed a page at a time with
the same pagination rules the app screens use.

Run 'companion gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults when absent)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize image files into resized, thumbnail and placeholder artifacts
    Prepare {
        /// Image files or directories to walk
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory for the derived files and manifest.json
        #[arg(long, default_value = "prepared")]
        out: PathBuf,
    },
    /// Print a blur placeholder data URI for an image URL or path
    Placeholder {
        /// data: URL, file:// URL or filesystem path
        url: String,
    },
    /// Page through a catalog export
    Browse {
        /// JSON array of rows
        file: PathBuf,
        /// Row type in the file
        #[arg(long, value_enum)]
        kind: CatalogKind,
        /// Pages to load; 0 loads until the end
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum CatalogKind {
    Characters,
    ShopItems,
    CoinPackages,
    WheelRewards,
    Coupons,
}

impl CatalogKind {
    fn collection_name(self) -> &'static str {
        match self {
            CatalogKind::Characters => "characters",
            CatalogKind::ShopItems => "shop_items",
            CatalogKind::CoinPackages => "coin_packages",
            CatalogKind::WheelRewards => "wheel_rewards",
            CatalogKind::Coupons => "coupons",
        }
    }
}

/// One prepared upload as recorded in `manifest.json`.
#[derive(Serialize)]
struct ManifestEntry {
    source: String,
    fingerprint: String,
    resized: String,
    width: u32,
    height: u32,
    thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "companion_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Prepare { inputs, out } => {
            let config = config::load_config(Some(&cli.config))?;
            prepare(&config, &inputs, &out)?;
        }
        Command::Placeholder { url } => {
            let config = config::load_config(Some(&cli.config))?;
            let pipeline = PipelineConfig::from_app_config(&config);
            let placeholder =
                blur_placeholder(&RustBackend::new(), &LocalLoader, &url, &pipeline.placeholder);
            for line in output::format_placeholder(&url, placeholder.as_deref()) {
                println!("{}", line);
            }
        }
        Command::Browse { file, kind, pages } => {
            let config = config::load_config(Some(&cli.config))?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let name = kind.collection_name();
            runtime.block_on(async {
                match kind {
                    CatalogKind::Characters => {
                        browse::<Character>(name, &file, &config.paging, pages).await
                    }
                    CatalogKind::ShopItems => {
                        browse::<ShopItem>(name, &file, &config.paging, pages).await
                    }
                    CatalogKind::CoinPackages => {
                        browse::<CoinPackage>(name, &file, &config.paging, pages).await
                    }
                    CatalogKind::WheelRewards => {
                        browse::<WheelReward>(name, &file, &config.paging, pages).await
                    }
                    CatalogKind::Coupons => {
                        browse::<Coupon>(name, &file, &config.paging, pages).await
                    }
                }
            })?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn prepare(
    config: &AppConfig,
    inputs: &[PathBuf],
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    init_thread_pool(&config.processing);
    let pipeline = PipelineConfig::from_app_config(config);
    let backend = RustBackend::new();

    let paths = collect_inputs(inputs);
    info!(files = paths.len(), "Preparing uploads");

    // Read failures keep their slot so output order follows input order
    let mut slots = Vec::with_capacity(paths.len());
    let mut sources = Vec::new();
    for path in &paths {
        match SourceFile::from_path(path) {
            Ok(source) => {
                sources.push(source);
                slots.push(None);
            }
            Err(e) => slots.push(Some(Err(e))),
        }
    }
    let mut prepared = prepare_batch(sources, &pipeline, &backend).into_iter();
    let results: Vec<Result<ImageAsset, UploadError>> = slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| prepared.next()))
        .collect();

    std::fs::create_dir_all(out)?;
    let mut manifest = Vec::new();
    let mut bytes_saved = 0i64;

    for (i, (path, result)) in paths.iter().zip(&results).enumerate() {
        let lines = match result {
            Ok(asset) => {
                let written = write_asset(asset, out)?;
                bytes_saved += asset.bytes_saved();
                manifest.push(ManifestEntry {
                    source: path.display().to_string(),
                    fingerprint: asset.fingerprint.clone(),
                    resized: written.resized.clone(),
                    width: asset.resized.width,
                    height: asset.resized.height,
                    thumbnail: written.thumbnail.clone(),
                    placeholder: asset.placeholder.clone(),
                });
                output::format_prepared(i + 1, asset, &written)
            }
            Err(e) => output::format_rejected(i + 1, &path.display().to_string(), e),
        };
        for line in lines {
            println!("{}", line);
        }
    }

    let manifest_path = out.join("manifest.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
    debug!(path = %manifest_path.display(), "Wrote manifest");

    println!();
    println!(
        "{}",
        output::format_prepare_summary(manifest.len(), results.len(), bytes_saved)
    );
    Ok(())
}

fn write_asset(asset: &ImageAsset, out: &Path) -> std::io::Result<WrittenFiles> {
    let stem = asset.stem();
    let written = WrittenFiles {
        resized: format!("{stem}.jpg"),
        thumbnail: format!("{stem}-thumb.jpg"),
    };
    std::fs::write(out.join(&written.resized), &asset.resized.bytes)?;
    std::fs::write(out.join(&written.thumbnail), &asset.thumbnail.bytes)?;
    Ok(written)
}

/// Expand directories into the image files beneath them, sorted by path.
/// Plain file arguments are passed through so rejections get reported.
fn collect_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .and_then(companion_core::imaging::mime_type_for_extension)
                        .is_some()
                })
                .collect();
            found.sort();
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    paths
}

async fn browse<R>(
    name: &str,
    file: &Path,
    paging: &PagingConfig,
    pages: u32,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: Listing + DeserializeOwned,
{
    let collection = Arc::new(InMemoryCollection::<R>::from_json_file(name, file)?);
    let sync = PagedListSync::new(collection, paging);

    let mut loaded = 0;
    while pages == 0 || loaded < pages {
        let before = sync.len();
        match sync.load_next().await {
            LoadOutcome::Loaded { .. } => {
                loaded += 1;
                for line in output::format_page(name, &sync.snapshot(), before, Utc::now()) {
                    println!("{}", line);
                }
            }
            LoadOutcome::Failed(e) => return Err(e.into()),
            LoadOutcome::Skipped(_) | LoadOutcome::Discarded => break,
        }
    }
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediastore_files::{
    FileRecord, Files, FilesService, ImageRecord, Images, MemoryImages, RandomUuidSource,
    Sha1Hash, StoreConfig, UuidSource, resolve_data_dir,
};

#[derive(Parser)]
#[command(name = "mediastore")]
#[command(about = "Content-addressed file and image records")]
struct Cli {
    /// Data directory for stored files
    #[arg(long, global = true, env = "MEDIASTORE_DATA_DIR")]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the record derived from a file without storing it
    Inspect {
        path: PathBuf,
        /// Include the base64 blob in the output
        #[arg(long)]
        blob: bool,
    },
    /// Store a file
    Add { path: PathBuf },
    /// Print a stored file by id
    Get {
        id: String,
        #[arg(long)]
        blob: bool,
    },
    /// Print a stored file by SHA-1 digest
    Find {
        sha1: String,
        #[arg(long)]
        blob: bool,
    },
    /// Delete a stored file by id
    Delete { id: String },
    /// Load the images of a directory and list them in order
    Gallery { dir: PathBuf },
}

/// Entry point for the mediastore CLI
///
/// # Environment Variables
/// - `MEDIASTORE_DATA_DIR`: Directory for stored files (default: "mediastore_data")
/// - `RUST_LOG`: Log filter (default directive: "mediastore=info")
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mediastore=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { path, blob } => {
            let record = read_record(&path)?;
            print_json(&if blob { record } else { record.without_blob() })?;
        }
        Commands::Add { path } => {
            let record = read_record(&path)?;
            let mut files = open_files(cli.data_dir)?;
            print_json(&files.save(&record, false)?)?;
        }
        Commands::Get { id, blob } => {
            let files = open_files(cli.data_dir)?;
            match files.get_by_id(&id, blob)? {
                Some(record) => print_json(&record)?,
                None => anyhow::bail!("no file with id {}", id),
            }
        }
        Commands::Find { sha1, blob } => {
            let sha1 = Sha1Hash::parse(&sha1)?;
            let files = open_files(cli.data_dir)?;
            match files.get_by_sha1(&sha1, blob)? {
                Some(record) => print_json(&record)?,
                None => anyhow::bail!("no file with digest {}", sha1),
            }
        }
        Commands::Delete { id } => {
            let mut files = open_files(cli.data_dir)?;
            let record = files
                .get_by_id(&id, false)?
                .ok_or_else(|| anyhow::anyhow!("no file with id {}", id))?;
            files.delete(record)?;
            println!("deleted {}", id);
        }
        Commands::Gallery { dir } => {
            let images = load_gallery(&dir, &RandomUuidSource)?;
            let mut all = images.get_all()?;
            all.reset();
            while let Some(image) = all.current() {
                println!("{}", serde_json::to_string(image)?);
                all.advance();
            }
        }
    }

    Ok(())
}

fn read_record(path: &Path) -> anyhow::Result<FileRecord> {
    FileRecord::from_file(path)
        .ok_or_else(|| anyhow::anyhow!("cannot read a non-empty file at {}", path.display()))
}

fn open_files(data_dir: Option<String>) -> anyhow::Result<FilesService> {
    let config = StoreConfig::new(resolve_data_dir(data_dir))?;
    config.ensure_data_dir()?;
    tracing::debug!("using data directory {}", config.data_dir().display());
    Ok(FilesService::from_config(&config)?)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Reads every image file directly inside `dir`, in file-name order.
///
/// Unreadable, empty and non-image files are skipped.
fn load_gallery(dir: &Path, uuid_source: &impl UuidSource) -> anyhow::Result<MemoryImages> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut images = MemoryImages::new();
    for path in paths {
        let Some(record) = FileRecord::from_file(&path) else {
            continue;
        };
        if !record.is_image() {
            tracing::debug!("skipping non-image {}", path.display());
            continue;
        }
        images.save(&ImageRecord::from_file_record(uuid_source.next_uuid(), record))?;
    }

    tracing::info!("loaded {} images from {}", images.len(), dir.display());
    Ok(images)
}

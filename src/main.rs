// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Command-line front end for Visio Annotate workspaces.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use visio_annotate::{ExportOutcome, Rect, Workspace, WorkspaceOptions};

#[derive(Parser)]
#[command(name = "visio-annotate", about = "Bounding box annotation workspace tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the images of a working folder and their annotations
    List {
        folder: PathBuf,
    },
    /// Add a bounding box (image pixel coordinates) to an image and save
    Add {
        folder: PathBuf,
        /// File name of the image inside the folder
        image: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Save annotations, or re-encode images into an output folder
    Export {
        folder: PathBuf,
        /// Output folder for re-encoded images
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Downsize exported images to this longest side (saved in workspace settings)
        #[arg(long)]
        max_dimension: Option<u32>,
    },
    /// Keep the folder open and report changes as they happen
    Watch {
        folder: PathBuf,
        /// Polling interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

fn open(folder: &Path, options: WorkspaceOptions) -> Result<Workspace> {
    let mut workspace = Workspace::new(options);
    workspace
        .set_working_folder(folder)
        .with_context(|| format!("Cannot open {}", folder.display()))?;
    Ok(workspace)
}

fn unwatched() -> WorkspaceOptions {
    WorkspaceOptions {
        watch: false,
        ..Default::default()
    }
}

fn list(folder: &Path) -> Result<()> {
    let workspace = open(folder, unwatched())?;
    for image in workspace.images() {
        let size = image
            .size()
            .map(|s| format!("{}x{}", s.width, s.height))
            .unwrap_or_else(|| "?".to_string());
        let mut flags = String::new();
        if image.is_active {
            flags.push('*');
        }
        if image.is_marked {
            flags.push('m');
        }
        if !image.is_enabled {
            flags.push('-');
        }
        println!(
            "{:<3}{} ({}) {} annotations",
            flags,
            image.short_name(),
            size,
            image.annotations.len()
        );
        for annotation in &image.annotations {
            let r = annotation.coordinates;
            println!(
                "      {} [{}, {}, {}, {}]",
                annotation.label, r.x, r.y, r.width, r.height
            );
        }
    }
    Ok(())
}

fn add(folder: &Path, name: &str, rect: Rect) -> Result<()> {
    let mut workspace = open(folder, unwatched())?;
    let path = workspace
        .working_folder()
        .context("Working folder not set")?
        .join(name);
    let id = workspace.add_annotation_to(&path, rect)?;
    let saved = workspace.save_annotations()?;

    let label = workspace
        .images()
        .iter()
        .find(|image| image.path == path)
        .and_then(|image| image.annotation(id))
        .map(|a| a.label.clone())
        .unwrap_or_default();
    println!("Added {} to {}, saved {}", label, name, saved.display());
    Ok(())
}

fn export(folder: &Path, out: Option<&Path>, max_dimension: Option<u32>) -> Result<()> {
    let mut workspace = open(folder, unwatched())?;
    if let Some(out) = out {
        workspace
            .set_output_folder(out)
            .with_context(|| format!("Cannot use output folder {}", out.display()))?;
    }
    if max_dimension.is_some() {
        workspace.update_settings(|s| s.export_max_dimension = max_dimension);
    }

    match workspace.export()? {
        ExportOutcome::AnnotationsSaved(path) => {
            println!("Saved annotations to {}", path.display());
        }
        ExportOutcome::ImagesExported { count, annotations } => {
            println!(
                "Exported {} images, annotations in {}",
                count,
                annotations.display()
            );
        }
    }
    Ok(())
}

fn watch(folder: &Path, interval: Duration) -> Result<()> {
    let mut workspace = open(
        folder,
        WorkspaceOptions {
            watch: true,
            watch_interval: interval,
        },
    )?;
    log::info!(
        "Watching {} ({} images), Ctrl-C to stop",
        folder.display(),
        workspace.images().len()
    );
    loop {
        if let Some(report) = workspace.wait_for_changes(Duration::from_secs(1)) {
            println!(
                "{} added, {} removed, {} images",
                report.added,
                report.removed,
                workspace.images().len()
            );
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::List { folder } => list(&folder),
        Commands::Add {
            folder,
            image,
            x,
            y,
            width,
            height,
        } => add(&folder, &image, Rect::new(x, y, width, height)),
        Commands::Export {
            folder,
            out,
            max_dimension,
        } => export(&folder, out.as_deref(), max_dimension),
        Commands::Watch {
            folder,
            interval_ms,
        } => watch(&folder, Duration::from_millis(interval_ms)),
    }
}

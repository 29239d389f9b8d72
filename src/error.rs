// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error type shared by the model, I/O and workspace layers.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("No working folder is set")]
    NoWorkingFolder,

    #[error("No encoder available for {0} output")]
    UnsupportedFormat(String),

    #[error("Image not in workspace: {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("Annotation labels cannot be empty")]
    EmptyLabel,

    #[error("Export aborted at {image}: {source}")]
    Export {
        image: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

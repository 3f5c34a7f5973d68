//! LayerPaint Application
//!
//! Loads a saved document and exports it to PNG through the render pipeline.

use layerpaint_core::{CanvasError, Document, SavedDocument};
use layerpaint_render::{ExportConfig, RenderError, prepare_for_export};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

pub const USAGE: &str = "usage: layerpaint <saved.json> <out.png> [dpi]";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type AppResult<T> = Result<T, AppError>;

/// Command-line configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Overrides the saved document's DPI.
    pub dpi: Option<u32>,
}

impl AppConfig {
    /// Parse positional arguments (program name already skipped).
    pub fn from_args(args: impl IntoIterator<Item = String>) -> AppResult<Self> {
        let mut args = args.into_iter();
        let input = args
            .next()
            .ok_or_else(|| AppError::Usage("missing input document".to_string()))?;
        let output = args
            .next()
            .ok_or_else(|| AppError::Usage("missing output path".to_string()))?;
        let dpi = args
            .next()
            .map(|s| {
                s.parse::<u32>()
                    .map_err(|_| AppError::Usage(format!("invalid dpi: {}", s)))
            })
            .transpose()?;
        if let Some(extra) = args.next() {
            return Err(AppError::Usage(format!("unexpected argument: {}", extra)));
        }

        Ok(Self {
            input: input.into(),
            output: output.into(),
            dpi,
        })
    }
}

/// Result of a successful export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Read a saved document, render it and write the PNG.
pub fn export_file(config: &AppConfig) -> AppResult<ExportSummary> {
    let json = fs::read_to_string(&config.input)?;
    let saved = SavedDocument::from_json(&json)?;
    let document = Document::load(saved);
    log::debug!("Loaded {}", config.input.display());

    let mut export = ExportConfig::default();
    if let Some(dpi) = config.dpi {
        export = export.with_dpi(dpi);
    }
    let job = prepare_for_export(&document, &export)?;
    let (width, height) = (job.width(), job.height());
    let png = pollster::block_on(job.encode(None))?;

    fs::write(&config.output, &png)?;
    Ok(ExportSummary {
        width,
        height,
        bytes: png.len(),
    })
}

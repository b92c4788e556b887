//! Map rendering: extent fitting, basemap painting and PNG output.
//!
//! # Responsibility
//! - Compute the viewport for a set of resolved cities.
//! - Paint basemap layers, graticule, markers and labels.
//! - Provide scoped temporary files for delivered maps.
//!
//! # Invariants
//! - Rendering is a pure one-shot transform; only the loaded basemap and font
//!   outlive a call.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod artifact;
pub mod basemap;
mod canvas;
pub mod graticule;
pub mod renderer;
pub mod viewport;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug)]
pub enum RenderError {
    Io(std::io::Error),
    Image(image::ImageError),
    Basemap { path: PathBuf, message: String },
    Font(String),
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Image(err) => write!(f, "image encoding failed: {err}"),
            Self::Basemap { path, message } => {
                write!(f, "invalid basemap layer `{}`: {message}", path.display())
            }
            Self::Font(message) => write!(f, "invalid font: {message}"),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Image(err) => Some(err),
            Self::Basemap { .. } | Self::Font(_) => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<image::ImageError> for RenderError {
    fn from(value: image::ImageError) -> Self {
        Self::Image(value)
    }
}

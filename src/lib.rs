//! Oncoprint rendering: a genes × samples grid colored by mutation type,
//! with percentage side labels, an optional sample annotation track and
//! legends, written out as PNG or SVG.

pub mod annotation;
pub mod canvas;
pub mod cell;
pub mod color;
pub mod error;
pub mod font;
pub mod io;
pub mod legend;
pub mod matrix;
pub mod prepare;
pub mod render;

pub use annotation::{AnnotationColors, AnnotationRow, AnnotationTable};
pub use canvas::{Canvas, RasterCanvas, SvgCanvas};
pub use color::{ColorMap, Rgb};
pub use error::{OncoprintError, Result};
pub use matrix::MutationMatrix;
pub use prepare::{GeneSelection, OncoprintOptions, SortMode};
pub use render::{draw_oncoprint, render_to_file, Oncoprint, OncoprintInput, RenderStyle};

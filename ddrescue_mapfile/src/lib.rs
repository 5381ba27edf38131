//! Model of GNU ddrescue mapfiles.
//!
//! [`parse_mapfile`] reads the text of a mapfile into a [`Mapfile`]: the
//! status line as a [`RescueStatus`] and the block-data lines as a contiguous
//! [`RescueMap`]. Sub-ranges of the map are summed into [`RescueTotals`] and
//! blended into a [`SquareColor`], one per square of a [`HeatMap`].

mod bytes;
mod color;
mod data;
mod document;
mod error;
mod grid;
mod map;
mod parse;
mod totals;

pub use bytes::{ByteOffset, ByteSpan};
pub use color::SquareColor;
pub use data::*;
pub use document::MapfileDocument;
pub use error::{Error, Result};
pub use grid::{HeatMap, Square, MAX_SQUARES};
pub use map::RescueMap;
pub use parse::{parse_lines, parse_mapfile, parse_number, MapfileParser};
pub use totals::RescueTotals;

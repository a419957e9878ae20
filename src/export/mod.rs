//! Exporters serializing the analytics bundle to report formats

mod csv;
mod json;
mod markdown;

pub use csv::to_csv;
pub use json::{from_json, to_json};
pub use markdown::to_markdown;

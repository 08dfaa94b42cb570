//! Rendering collaborators: Markdown documents, hand-built SVG charts and
//! summary file writers. Everything here is a terminal output; nothing is
//! ever read back by the report pipeline.

pub mod md;
pub mod svg;

mod io;

pub use crate::io::{write_json, write_summary_csv, write_table_csv, write_text};

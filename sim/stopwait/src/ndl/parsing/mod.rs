//! Mod file for parsing: allows use across the crate

pub mod parsing_data;
mod parser;
mod parser_util;
pub use parser::core_parser;
pub use parser_util::{general_parser, split_indent};
pub use parsing_data::*;

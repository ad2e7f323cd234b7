//! Output rendering for tables.
//!
//! # Example
//!
//! ```no_run
//! use sheetjson::{read_table, render::*};
//!
//! let table = read_table("zongce.xlsx")?;
//! let json = to_json(&table, JsonFormat::Compact)?;
//! # Ok::<(), sheetjson::Error>(())
//! ```

mod json;

pub use json::{to_json, to_json_default, JsonFormat};

//! Output writers selected through the format registry.

pub mod csv_writer;
pub mod json_writer;
pub mod multi_writer;

pub use csv_writer::CsvWriter;
pub use json_writer::JsonWriter;
pub use multi_writer::{FailurePolicy, MultiWriter};

pub const JSON_FORMAT: &str = "output_json";
pub const CSV_FORMAT: &str = "output_csv";

/// Formats known to the standard registry, in registration order.
pub const STANDARD_FORMATS: [&str; 2] = [JSON_FORMAT, CSV_FORMAT];

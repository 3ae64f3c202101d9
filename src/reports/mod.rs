pub mod generator;
pub mod formatters;

pub use generator::ReportGenerator;
pub use formatters::{JsonFormatter, MarkdownFormatter, ReportFormatter, TextFormatter};

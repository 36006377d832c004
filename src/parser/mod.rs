pub mod ui_short;

pub use ui_short::UiShortParser;

/// A request URL with its `$request_time`, in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub url: String,
    pub duration: f64,
}

pub trait LogParser {
    /// Returns `None` for lines that do not carry a usable request
    fn parse(&self, line: &str) -> Option<ParsedEntry>;
}

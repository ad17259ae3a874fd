//! Report formatting styles.

use std::fmt;

/// How a debug report renders its section headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// Simple markdown, readable in any text view.
    #[default]
    Plain,
    /// GitHub-flavored markdown with collapsible sections.
    GitHub,
}

impl ReportStyle {
    /// Resolve a style from a query value.
    ///
    /// Only `"github"` is recognized; everything else, including the empty
    /// string, yields [`ReportStyle::Plain`].
    pub fn from_query(value: &str) -> Self {
        match value {
            "github" => ReportStyle::GitHub,
            _ => ReportStyle::Plain,
        }
    }

    /// Label used for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStyle::Plain => "plain",
            ReportStyle::GitHub => "github",
        }
    }
}

impl fmt::Display for ReportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Section accumulation and rendering.

use std::fmt::Write as _;

use axum::body::Bytes;

use crate::report::style::ReportStyle;

bitflags::bitflags! {
    /// Rendering hints for a single section.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SectionFlags: u8 {
        /// Put an empty line between content lines.
        const ADD_CONTENT_LINE_BREAKS = 1;
        /// Wrap the content in a fenced code block.
        const USE_CODE_SECTION = 1 << 1;
        /// Collapse the section behind a `<details>` disclosure (GitHub only).
        const USE_DISCLOSURE = 1 << 2;
    }
}

/// Content of a section, filled in by whoever owns the data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionBody {
    pub flags: SectionFlags,
    pub lines: Vec<String>,
}

impl SectionBody {
    pub fn new(flags: SectionFlags) -> Self {
        Self {
            flags,
            lines: Vec::new(),
        }
    }

    /// Body used in place of content that could not be collected.
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self {
            flags: SectionFlags::empty(),
            lines: vec![format!("unavailable: {}", reason)],
        }
    }

    pub fn set_flags(&mut self, flags: SectionFlags) {
        self.flags = flags;
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn extend_lines<I, L>(&mut self, lines: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A titled report section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub body: SectionBody,
}

impl Section {
    pub fn new(title: impl Into<String>, body: SectionBody) -> Self {
        Self {
            title: title.into(),
            body,
        }
    }
}

/// An ordered debug report for one request.
#[derive(Debug, Clone, Default)]
pub struct DebugReport {
    style: ReportStyle,
    sections: Vec<Section>,
}

impl DebugReport {
    pub fn new(style: ReportStyle) -> Self {
        Self {
            style,
            sections: Vec::new(),
        }
    }

    pub fn style(&self) -> ReportStyle {
        self.style
    }

    /// Append a section built from raw lines.
    pub fn add_section<I, L>(&mut self, title: impl Into<String>, flags: SectionFlags, lines: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let mut body = SectionBody::new(flags);
        body.extend_lines(lines);
        self.push(Section::new(title, body));
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.title.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render the report as markdown text.
    pub fn render(&self) -> String {
        let mut out = String::new();

        for section in &self.sections {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            self.render_section(&mut out, section);
        }

        out
    }

    /// Serialize the report into response bytes.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.render())
    }

    fn render_section(&self, out: &mut String, section: &Section) {
        let flags = section.body.flags;
        let disclosure =
            self.style == ReportStyle::GitHub && flags.contains(SectionFlags::USE_DISCLOSURE);

        // Writing into a String never fails.
        let _ = match (self.style, disclosure) {
            (_, true) => write!(out, "<details>\n<summary>{}</summary>\n\n", section.title),
            (ReportStyle::GitHub, false) => write!(out, "#### {}\n\n", section.title),
            (ReportStyle::Plain, false) => write!(out, "**{}**:\n\n", section.title),
        };

        if flags.contains(SectionFlags::USE_CODE_SECTION) {
            out.push_str("```\n");
        }
        for (i, line) in section.body.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
                if flags.contains(SectionFlags::ADD_CONTENT_LINE_BREAKS) {
                    out.push('\n');
                }
            }
            out.push_str(line);
        }
        if flags.contains(SectionFlags::USE_CODE_SECTION) {
            out.push_str("\n```");
        }

        if disclosure {
            out.push_str("\n</details>");
        }
    }
}

//! Résumé builder: lays a draft out as positioned text lines and exports it.

use serde::{Deserialize, Serialize};

use crate::config::ResumeConfig;

pub const HEADING: &str = "Resume";
pub const MISSING_VALUE: &str = "N/A";
pub const HEADING_Y: u32 = 10;
pub const FIRST_LINE_Y: u32 = 20;
pub const LINE_HEIGHT: u32 = 10;
pub const LEFT_MARGIN: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeDraft {
    pub name: String,
    pub experience: String,
    pub skills: String,
    pub education: String,
    pub location: String,
    pub job_type: String,
    pub industry: String,
    pub certifications: String,
    pub languages: String,
    pub portfolio: String,
}

impl ResumeDraft {
    /// Labelled fields in print order.
    pub fn fields(&self) -> [(&'static str, &str); 10] {
        [
            ("Full Name", &self.name),
            ("Experience", &self.experience),
            ("Skills", &self.skills),
            ("Education", &self.education),
            ("Preferred Location", &self.location),
            ("Job Type", &self.job_type),
            ("Industry", &self.industry),
            ("Certifications", &self.certifications),
            ("Languages", &self.languages),
            ("Portfolio", &self.portfolio),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeLine {
    pub x: u32,
    pub y: u32,
    pub text: String,
}

/// Positioned lines ready for an encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeDocument {
    pub heading: ResumeLine,
    pub lines: Vec<ResumeLine>,
}

impl ResumeDocument {
    pub fn plain_text(&self) -> String {
        let mut text = String::with_capacity(64 * (self.lines.len() + 1));
        text.push_str(&self.heading.text);
        text.push('\n');
        for line in &self.lines {
            text.push_str(&line.text);
            text.push('\n');
        }
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeLayout {
    wrap_columns: usize,
}

impl ResumeLayout {
    pub fn new(wrap_columns: usize) -> Self {
        Self {
            wrap_columns: wrap_columns.max(1),
        }
    }

    pub fn from_config(config: &ResumeConfig) -> Self {
        Self::new(config.wrap_columns)
    }

    pub fn render(&self, draft: &ResumeDraft) -> ResumeDocument {
        let mut lines = Vec::new();
        let mut y = FIRST_LINE_Y;

        for (label, value) in draft.fields() {
            let value = if value.trim().is_empty() {
                MISSING_VALUE
            } else {
                value
            };
            for text in wrap(&format!("{label}: {value}"), self.wrap_columns) {
                lines.push(ResumeLine {
                    x: LEFT_MARGIN,
                    y,
                    text,
                });
                y += LINE_HEIGHT;
            }
        }

        ResumeDocument {
            heading: ResumeLine {
                x: LEFT_MARGIN,
                y: HEADING_Y,
                text: HEADING.to_string(),
            },
            lines,
        }
    }
}

impl Default for ResumeLayout {
    fn default() -> Self {
        Self::from_config(&ResumeConfig::default())
    }
}

/// Greedy word wrap; words longer than the width are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encoded résumé file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedResume {
    pub content_type: mime::Mime,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("resume encoder failed: {0}")]
    Encoder(String),
}

/// Turns a laid-out résumé into a downloadable file.
pub trait ResumeExporter: Send + Sync {
    fn export(&self, document: &ResumeDocument) -> Result<ExportedResume, ExportError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExporter;

impl ResumeExporter for PlainTextExporter {
    fn export(&self, document: &ResumeDocument) -> Result<ExportedResume, ExportError> {
        Ok(ExportedResume {
            content_type: mime::TEXT_PLAIN_UTF_8,
            file_name: "resume.txt".to_string(),
            bytes: document.plain_text().into_bytes(),
        })
    }
}

//! Persona prompt template.

use std::path::Path;

use clonechat_core::{Error, Result};

/// Built-in persona template.
pub const DEFAULT_TEMPLATE: &str = include_str!("../assets/persona_prompt.txt");

const CONTEXT: &str = "{context}";
const QUESTION: &str = "{question}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Context,
    Question,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

/// A template parsed once into literal text and placeholder slots, so that
/// rendering is a single pass and substituted values are never re-scanned.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    literal_len: usize,
}

impl PromptTemplate {
    /// The bundled persona template.
    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_TEMPLATE)
    }

    /// Parse a template. `{context}` and `{question}` must each occur
    /// exactly once.
    pub fn parse(template: &str) -> Result<Self> {
        for placeholder in [CONTEXT, QUESTION] {
            let count = template.matches(placeholder).count();
            if count != 1 {
                return Err(Error::Config(format!(
                    "Prompt template must contain {} exactly once (found {})",
                    placeholder, count
                )));
            }
        }

        let mut segments = Vec::with_capacity(4);
        let mut rest = template;
        loop {
            let next = [(CONTEXT, Slot::Context), (QUESTION, Slot::Question)]
                .into_iter()
                .filter_map(|(p, slot)| rest.find(p).map(|i| (i, p.len(), slot)))
                .min_by_key(|(i, _, _)| *i);

            match next {
                Some((i, len, slot)) => {
                    if i > 0 {
                        segments.push(Segment::Literal(rest[..i].to_string()));
                    }
                    segments.push(Segment::Slot(slot));
                    rest = &rest[i + len..];
                }
                None => {
                    if !rest.is_empty() {
                        segments.push(Segment::Literal(rest.to_string()));
                    }
                    break;
                }
            }
        }

        let literal_len = segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.len(),
                Segment::Slot(_) => 0,
            })
            .sum();

        Ok(Self {
            segments,
            literal_len,
        })
    }

    /// Load a replacement template from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read prompt file {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.literal_len + context.len() + question.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(Slot::Context) => out.push_str(context),
                Segment::Slot(Slot::Question) => out.push_str(question),
            }
        }
        out
    }
}

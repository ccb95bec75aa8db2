//! Path template compilation.
//!
//! A path template is a string with `${field}` placeholders, for example
//! `${year}/${month}/${name}${ext}`. Only the [`Field`]s of a
//! [`PathContext`] may be referenced; anything else is rejected when the
//! template is compiled, so rendering never fails.

use thiserror::Error;

use super::context::{Field, PathContext};

/// Template compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template references a field the path context does not have.
    #[error("unknown placeholder `{0}`")]
    UnknownPlaceholder(String),

    /// A `${` without a closing `}`.
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Compile a template string.
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder is unterminated or names an
    /// unknown field.
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("${") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let body = &rest[start + 2..];
            let end = body
                .find('}')
                .ok_or(TemplateError::Unterminated(offset + start))?;
            let name = body[..end].trim();
            let field = Field::from_name(name)
                .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
            segments.push(Segment::Field(field));

            let consumed = start + 2 + end + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Substitute every placeholder with its value from `context`.
    #[must_use]
    pub fn render(&self, context: &PathContext) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Field(field) => context.get(*field),
            })
            .collect()
    }

    /// The template string this was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Split a path format into its directory and file name parts.
///
/// Follows POSIX `dirname`/`basename`: trailing slashes are ignored and a
/// format without a slash has the directory `.`.
#[must_use]
pub fn split_format(format: &str) -> (&str, &str) {
    let trimmed = format.trim_end_matches('/');
    if trimmed.is_empty() {
        let dir = if format.is_empty() { "." } else { "/" };
        return (dir, "");
    }

    match trimmed.rfind('/') {
        None => (".", trimmed),
        Some(idx) => {
            let dir = trimmed[..idx].trim_end_matches('/');
            let dir = if dir.is_empty() { "/" } else { dir };
            (dir, &trimmed[idx + 1..])
        }
    }
}

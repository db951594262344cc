//! Path patterns and path parameters.
//!
//! # Responsibilities
//! - Parse `/a/:name/b` style patterns once, at registration time
//! - Match a concrete request path segment by segment, binding parameters
//! - Render a pattern back into a concrete path from bound parameters
//!
//! # Design Decisions
//! - A placeholder is a whole segment (`:id`), never a substring, so `:i` cannot collide with `:id`
//! - Segment counts must be equal; there is no wildcard or trailing-slash folding
//! - Literal comparison is case-sensitive with no normalization
//! - Bound values are the segments as they appear in the request target

use std::fmt;

use thiserror::Error;

/// Errors raised while parsing or rendering a pattern.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    #[error("pattern {0:?} has a placeholder without a name")]
    EmptyParamName(String),

    #[error("pattern {pattern:?} binds :{name} more than once")]
    DuplicateParam { pattern: String, name: String },

    #[error("no value bound for :{0}")]
    MissingParam(String),
}

/// One `/`-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path pattern such as `/service/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern. It must be absolute; `:name` segments become placeholders.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }

        let mut segments = Vec::new();
        for part in raw.split('/') {
            match part.strip_prefix(':') {
                Some("") => return Err(PatternError::EmptyParamName(raw.to_string())),
                Some(name) => {
                    if segments.iter().any(|s| matches!(s, Segment::Param(n) if n == name)) {
                        return Err(PatternError::DuplicateParam {
                            pattern: raw.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of every placeholder, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Structurally match `path`, returning the bound parameters on success.
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::default();
        let mut actual = path.split('/');

        for segment in &self.segments {
            let value = actual.next()?;
            match segment {
                Segment::Literal(lit) if lit == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.push(name.clone(), value.to_string()),
            }
        }

        // Leftover segments mean the path is longer than the pattern.
        if actual.next().is_some() {
            return None;
        }

        Some(params)
    }

    /// Substitute every placeholder with its bound value.
    pub fn render(&self, params: &PathParams) -> Result<String, PatternError> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => parts.push(lit.as_str()),
                Segment::Param(name) => parts.push(
                    params
                        .get(name)
                        .ok_or_else(|| PatternError::MissingParam(name.clone()))?,
                ),
            }
        }
        Ok(parts.join("/"))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A named value bound by matching a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    pub name: String,
    pub value: String,
}

/// Parameters bound by one match, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<PathParam>);

impl PathParams {
    fn push(&mut self, name: String, value: String) {
        self.0.push(PathParam { name, value });
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathParam> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

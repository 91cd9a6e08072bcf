//! Route pattern matching.
//!
//! # Responsibilities
//! - Split request and route paths into segments
//! - Compile a route path into a pattern (pass-through, wildcard, segments)
//! - Match a pattern against the front of the remaining request segments
//!
//! # Design Decisions
//! - Literal segments are case-sensitive
//! - `:name` and `{name}` both declare a parameter
//! - `full` policy only constrains segment patterns; pass-through and
//!   wildcard patterns ignore it
//! - No regex, matching is a positional comparison

use crate::config::PathMatch;
use crate::message::Params;

/// Route path that swallows whatever is left of the request path.
pub const WILDCARD: &str = "**";

/// Split a path into its segments, trimming one leading and one trailing `/`.
///
/// `""` and `"/"` yield no segments.
pub fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// Parameter name of a `:name` or `{name}` segment.
pub fn param_name(segment: &str) -> Option<&str> {
    if let Some(name) = segment.strip_prefix(':') {
        Some(name)
    } else {
        segment
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
    }
}

/// One compiled segment of a route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Empty path: matches without consuming anything.
    PassThrough,
    /// `**`: matches and consumes everything that is left.
    Wildcard,
    Segments(Vec<Segment>),
}

/// Outcome of a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matched {
    pub consumed: usize,
    pub params: Params,
}

impl Pattern {
    pub fn compile(path: &str) -> Self {
        let segments = split_path(path);
        match segments.as_slice() {
            [] => Pattern::PassThrough,
            [only] if *only == WILDCARD => Pattern::Wildcard,
            _ => Pattern::Segments(
                segments
                    .into_iter()
                    .map(|s| match param_name(s) {
                        Some(name) => Segment::Param(name.to_string()),
                        None => Segment::Literal(s.to_string()),
                    })
                    .collect(),
            ),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Pattern::PassThrough)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Pattern::Wildcard)
    }

    /// Match against the front of `remaining`.
    pub fn matches(&self, remaining: &[&str], policy: PathMatch) -> Option<Matched> {
        match self {
            Pattern::PassThrough => Some(Matched::default()),
            Pattern::Wildcard => Some(Matched {
                consumed: remaining.len(),
                params: Params::new(),
            }),
            Pattern::Segments(segments) => {
                if segments.len() > remaining.len() {
                    return None;
                }
                if policy == PathMatch::Full && segments.len() != remaining.len() {
                    return None;
                }

                let mut params = Params::new();
                for (segment, actual) in segments.iter().zip(remaining) {
                    match segment {
                        Segment::Literal(literal) if literal == actual => {}
                        Segment::Literal(_) => return None,
                        Segment::Param(name) => {
                            params.insert(name.clone(), actual.to_string());
                        }
                    }
                }

                Some(Matched {
                    consumed: segments.len(),
                    params,
                })
            }
        }
    }
}

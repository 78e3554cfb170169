//! Hierarchical resource names
//!
//! A resource name is either the literal `*` or `res:TYPE=ID(/TYPE=ID)*`,
//! where `TYPE` is drawn from `[A-Za-z0-9_]` and `ID` from `[A-Za-z0-9_-]`
//! or is itself `*`. Names without any `*` are *definite* and identify a
//! single resource; the rest are patterns and only appear in policies.
//!
//! # Examples
//!
//! ```
//! use gatekeep_authz::resource::ResourceName;
//!
//! let pattern = ResourceName::new("res:team=acme/project=*").parse().unwrap();
//! let target = ResourceName::new("res:team=acme/project=web").parse().unwrap();
//!
//! assert!(pattern.contains(&target));
//! assert!(!target.contains(&pattern));
//! ```

use crate::error::{AuthzError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Wildcard marker, valid as a whole name or as a segment ID
pub const WILDCARD: &str = "*";

/// Prefix shared by every non-wildcard resource name
pub const NAME_PREFIX: &str = "res:";

const SEGMENT_SEPARATOR: char = '/';
const TYPE_ID_SEPARATOR: char = '=';

fn name_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^res:[A-Za-z0-9_]+=(?:[A-Za-z0-9_-]+|\*)(?:/[A-Za-z0-9_]+=(?:[A-Za-z0-9_-]+|\*))*$")
            .expect("resource name grammar is a valid regex")
    })
}

fn segment_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_]+)=([A-Za-z0-9_-]+|\*)$")
            .expect("resource segment grammar is a valid regex")
    })
}

/// Any `$name` token, optionally preceded by the `TYPE=` it stands in for
fn variable_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"(?:([A-Za-z0-9_]+)=)?\$([A-Za-z0-9_]+)")
            .expect("variable token grammar is a valid regex")
    })
}

/// A single `(Type, ID)` pair, the atomic unit of a resource path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceSegment {
    /// Resource type (team, project, ws, user, ...)
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Resource identifier, or `*` inside patterns
    pub id: String,
}

impl ResourceSegment {
    /// Create a segment from its type and ID
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// The segment the literal `*` name parses to
    pub fn wildcard() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    /// Whether the ID position is a wildcard
    pub fn has_wildcard_id(&self) -> bool {
        self.id == WILDCARD
    }

    /// Whether this is the all-wildcard segment
    pub fn is_wildcard(&self) -> bool {
        self.resource_type == WILDCARD && self.id == WILDCARD
    }
}

impl fmt::Display for ResourceSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.resource_type, TYPE_ID_SEPARATOR, self.id)
    }
}

impl FromStr for ResourceSegment {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = segment_grammar()
            .captures(s)
            .ok_or_else(|| AuthzError::invalid_name(s, "segment must be TYPE=ID"))?;

        Ok(Self::new(&caps[1], &caps[2]))
    }
}

/// A textual resource name, possibly a pattern
///
/// Construction does not validate; call [`ResourceName::valid`] or
/// [`ResourceName::parse`] before relying on the structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    /// Wrap a raw name string
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The `*` name, matching every resource
    pub fn wildcard() -> Self {
        Self(WILDCARD.to_string())
    }

    /// Render segments root-to-leaf as `res:TYPE=ID/...`
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a ResourceSegment>) -> Self {
        let path = segments
            .into_iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/");
        Self(format!("{}{}", NAME_PREFIX, path))
    }

    /// Raw name string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name with its `res:` prefix stripped
    pub fn path(&self) -> &str {
        self.0.strip_prefix(NAME_PREFIX).unwrap_or(&self.0)
    }

    /// True iff the name is `*` or matches the resource name grammar
    pub fn valid(&self) -> bool {
        self.0 == WILDCARD || name_grammar().is_match(&self.0)
    }

    /// True iff the name contains no `*` at all
    pub fn is_definite(&self) -> bool {
        !self.0.contains(WILDCARD)
    }

    /// Parse into an ordered segment sequence
    ///
    /// # Errors
    ///
    /// Returns `InvalidResourceName` if the name is not [`valid`](Self::valid).
    pub fn parse(&self) -> Result<ParsedResourceName> {
        if !self.valid() {
            return Err(AuthzError::invalid_name(
                &self.0,
                "expected res:TYPE=ID(/TYPE=ID)* or *",
            ));
        }

        if self.0 == WILDCARD {
            return Ok(ParsedResourceName::all_wildcard());
        }

        let segments = self
            .path()
            .split(SEGMENT_SEPARATOR)
            .map(ResourceSegment::from_str)
            .collect::<Result<Vec<_>>>()?;

        Ok(ParsedResourceName { segments })
    }

    /// Parse a name that must identify exactly one resource
    pub fn parse_definite(&self) -> Result<ParsedResourceName> {
        if !self.valid() || !self.is_definite() {
            return Err(AuthzError::invalid_name(
                &self.0,
                "expected a definite name without wildcards",
            ));
        }
        self.parse()
    }

    /// New name with `segment` as the outermost (root) segment
    ///
    /// Prepending to an empty name yields a single-segment name.
    pub fn prepend(&self, segment: &ResourceSegment) -> ResourceName {
        let path = self.path();
        if path.is_empty() {
            return ResourceName(format!("{}{}", NAME_PREFIX, segment));
        }
        ResourceName(format!("{}{}{}{}", NAME_PREFIX, segment, SEGMENT_SEPARATOR, path))
    }

    /// Substitute every `$variable` token with `value`'s path
    ///
    /// A token standing in an ID position (`TYPE=$variable`) whose value
    /// starts with the same `TYPE=` splices the value's full path in place
    /// of the whole segment, so `res:user=$subject/ws=*` with subject
    /// `res:user=bob` becomes `res:user=bob/ws=*`.
    pub fn replace_variable(&self, variable: &str, value: &ResourceName) -> ResourceName {
        let replacement = value.path();
        let token = format!("${}", variable);
        if !self.0.contains(&token) {
            return self.clone();
        }

        let substituted = variable_grammar().replace_all(&self.0, |caps: &Captures<'_>| {
            if &caps[2] != variable {
                return caps[0].to_string();
            }

            match caps.get(1) {
                Some(ty) => {
                    let ty = ty.as_str();
                    let same_root = replacement
                        .strip_prefix(ty)
                        .is_some_and(|rest| rest.starts_with(TYPE_ID_SEPARATOR));
                    if same_root {
                        replacement.to_string()
                    } else {
                        format!("{}{}{}", ty, TYPE_ID_SEPARATOR, replacement)
                    }
                }
                None => replacement.to_string(),
            }
        });

        ResourceName(substituted.into_owned())
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ResourceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        name.0
    }
}

/// A parsed resource name: segments ordered root-to-leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedResourceName {
    segments: Vec<ResourceSegment>,
}

impl ParsedResourceName {
    /// Build from segments ordered root-to-leaf
    pub fn from_segments(segments: Vec<ResourceSegment>) -> Self {
        Self { segments }
    }

    /// The parsed form of `*`
    pub fn all_wildcard() -> Self {
        Self {
            segments: vec![ResourceSegment::wildcard()],
        }
    }

    pub fn segments(&self) -> &[ResourceSegment] {
        &self.segments
    }

    /// Hierarchy depth
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The innermost segment
    pub fn leaf(&self) -> Option<&ResourceSegment> {
        self.segments.last()
    }

    pub fn is_all_wildcard(&self) -> bool {
        self.segments.len() == 1 && self.segments[0].is_wildcard()
    }

    pub fn is_definite(&self) -> bool {
        self.segments
            .iter()
            .all(|s| !s.has_wildcard_id() && s.resource_type != WILDCARD)
    }

    /// Whether this name (as a pattern) matches `other`
    ///
    /// Matching is depth-exact: a pattern never reaches a shallower or
    /// deeper resource. Types always match literally; only IDs may be `*`.
    pub fn contains(&self, other: &ParsedResourceName) -> bool {
        if self.is_all_wildcard() {
            return true;
        }

        if self.is_definite() {
            return self.segments == other.segments;
        }

        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(pattern, candidate)| {
                    pattern.resource_type == candidate.resource_type
                        && (pattern.has_wildcard_id() || pattern.id == candidate.id)
                })
    }

    /// Render back into textual form
    pub fn to_resource_name(&self) -> ResourceName {
        if self.is_all_wildcard() {
            return ResourceName::wildcard();
        }
        ResourceName::from_segments(&self.segments)
    }
}

impl fmt::Display for ParsedResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_resource_name())
    }
}

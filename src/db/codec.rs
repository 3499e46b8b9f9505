//! Field codec: converts a single typed value to and from its stored text token.
//!
//! Encoding is total for any declared kind; handing the codec a value that does
//! not match its declared kind is a configuration mistake and is raised eagerly
//! as [`StorageError::Config`]. Decoding is the opposite: an empty or
//! unparsable token yields `None` so the caller can keep whatever default the
//! field already holds.

use std::fmt;

use uuid::Uuid;

use crate::db::error::StorageError;

/// A decoded field value, independent of the entity it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    /// Composite values (uuid lists, adapter payloads) nest recursively.
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(id) => Some(*id),
            _ => None,
        }
    }

    /// Extract a homogeneous uuid list, the common shape of entity references.
    pub fn as_uuid_list(&self) -> Option<Vec<Uuid>> {
        match self {
            Self::List(items) => items.iter().map(FieldValue::as_uuid).collect(),
            _ => None,
        }
    }
}

/// Pluggable marshalling for complex values that round-trip through a single
/// stored token (e.g. comma-joined composite fields).
pub trait FieldAdapter: Sync {
    /// Short name used in configuration-error messages.
    fn name(&self) -> &'static str;

    /// Marshal the value into its stored token. A shape mismatch is a
    /// configuration error, never silently dropped.
    fn to_token(&self, value: &FieldValue) -> Result<String, StorageError>;

    /// Parse the stored token; `None` means the token cannot be interpreted
    /// and the field keeps its default.
    fn from_token(&self, token: &str) -> Option<FieldValue>;
}

/// Declared storage kind of a field. Governs which codec path interprets it.
#[derive(Clone, Copy)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Text,
    Uuid,
    /// Enum fields parse against a fixed variant-name table.
    Enum(&'static [&'static str]),
    /// Comma-joined list of a single element kind.
    List(&'static FieldKind),
    /// Complex values marshalled through a registered adapter.
    Adapted(&'static dyn FieldAdapter),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
            Self::Uuid => write!(f, "uuid"),
            Self::Enum(_) => write!(f, "enum"),
            Self::List(elem) => write!(f, "list of {}", elem),
            Self::Adapted(adapter) => write!(f, "adapted ({})", adapter.name()),
        }
    }
}

/// Render a value as its stored token under the declared kind.
pub fn encode(value: &FieldValue, kind: &FieldKind) -> Result<String, StorageError> {
    match (kind, value) {
        (FieldKind::Bool, FieldValue::Bool(b)) => Ok(b.to_string()),
        (FieldKind::Int, FieldValue::Int(i)) => Ok(i.to_string()),
        (FieldKind::Float, FieldValue::Float(x)) => Ok(x.to_string()),
        (FieldKind::Text, FieldValue::Text(s)) => Ok(s.clone()),
        (FieldKind::Uuid, FieldValue::Uuid(id)) => Ok(id.to_string()),
        (FieldKind::Enum(variants), FieldValue::Text(name)) => {
            if variants.contains(&name.as_str()) {
                Ok(name.clone())
            } else {
                Err(StorageError::Config(format!(
                    "'{}' is not a declared variant of this enum field",
                    name
                )))
            }
        }
        (FieldKind::List(elem), FieldValue::List(items)) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(encode(item, elem)?);
            }
            Ok(parts.join(","))
        }
        (FieldKind::Adapted(adapter), value) => adapter.to_token(value),
        (kind, value) => Err(StorageError::Config(format!(
            "cannot encode {:?} as {}",
            value, kind
        ))),
    }
}

/// Parse a stored token under the declared kind. Empty and unparsable tokens
/// come back as `None`; the field's pre-existing default must stay in place.
pub fn decode(token: &str, kind: &FieldKind) -> Option<FieldValue> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    match kind {
        FieldKind::Bool => {
            if token.eq_ignore_ascii_case("true") {
                Some(FieldValue::Bool(true))
            } else if token.eq_ignore_ascii_case("false") {
                Some(FieldValue::Bool(false))
            } else {
                None
            }
        }
        FieldKind::Int => token.parse().ok().map(FieldValue::Int),
        FieldKind::Float => token.parse().ok().map(FieldValue::Float),
        FieldKind::Text => Some(FieldValue::Text(token.to_string())),
        FieldKind::Uuid => Uuid::parse_str(token).ok().map(FieldValue::Uuid),
        FieldKind::Enum(variants) => decode_enum(token, variants),
        FieldKind::List(elem) => {
            let mut items = Vec::new();
            for part in token.split(',') {
                items.push(decode(part, elem)?);
            }
            Some(FieldValue::List(items))
        }
        FieldKind::Adapted(adapter) => adapter.from_token(token),
    }
}

/// Resolve an enum token to its canonical variant name: exact match first,
/// ASCII case-insensitive fallback for records written by older releases.
pub fn decode_enum(token: &str, variants: &'static [&'static str]) -> Option<FieldValue> {
    if let Some(v) = variants.iter().find(|v| **v == token) {
        return Some(FieldValue::Text((*v).to_string()));
    }
    variants
        .iter()
        .find(|v| v.eq_ignore_ascii_case(token))
        .map(|v| FieldValue::Text((*v).to_string()))
}

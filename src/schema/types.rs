//! Normalized value-type descriptions derived from the schema.

use serde::{Serialize, Serializer};

/// Step used for `decimal` values that declare no `fractionDigits`.
pub const DEFAULT_DECIMAL_STEP: f64 = 0.01;

/// Serialized as a bare name: `"numeric"`, `"enum"`, or e.g. `"dateTime"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Numeric,
    String,
    Enum,
    File,
    Boolean,
    /// Any other built-in type, by its local name (e.g. `dateTime`).
    Other(String),
}

impl TypeKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Numeric => "numeric",
            Self::String => "string",
            Self::Enum => "enum",
            Self::File => "file",
            Self::Boolean => "boolean",
            Self::Other(name) => name,
        }
    }
}

impl Serialize for TypeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// What a value may hold, as far as an editor needs to know.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDescriptor {
    #[serde(rename = "type")]
    pub kind: TypeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl TypeDescriptor {
    #[must_use]
    pub const fn of(kind: TypeKind) -> Self {
        Self {
            kind,
            min: None,
            max: None,
            step: None,
            enum_values: Vec::new(),
        }
    }

    #[must_use]
    pub fn enumeration(values: Vec<String>) -> Self {
        Self {
            enum_values: values,
            ..Self::of(TypeKind::Enum)
        }
    }

    /// Describe a built-in type by (possibly prefixed) name: numeric types
    /// carry their implicit bounds and step, everything else its kind.
    #[must_use]
    pub fn builtin(type_name: &str) -> Self {
        if let Some(numeric) = numeric_builtin(type_name) {
            return numeric;
        }
        match local_name(type_name) {
            "string" | "normalizedString" | "token" => Self::of(TypeKind::String),
            "boolean" => Self::of(TypeKind::Boolean),
            other => Self::of(TypeKind::Other(other.to_string())),
        }
    }
}

/// Strip a namespace prefix: `xsd:int` → `int`.
#[must_use]
pub fn local_name(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

/// Numeric descriptor for a built-in numeric type, `None` for anything else.
#[must_use]
pub fn numeric_builtin(type_name: &str) -> Option<TypeDescriptor> {
    let base = local_name(type_name);
    let (min, max, step) = match base {
        "nonNegativeInteger" | "unsignedLong" | "unsignedInt" | "unsignedShort"
        | "unsignedByte" => (Some(0.0), None, 1.0),
        "nonPositiveInteger" => (None, Some(0.0), 1.0),
        "positiveInteger" => (Some(1.0), None, 1.0),
        "negativeInteger" => (None, Some(-1.0), 1.0),
        "decimal" => (None, None, DEFAULT_DECIMAL_STEP),
        "byte" | "int" | "integer" | "long" | "short" => (None, None, 1.0),
        _ => return None,
    };
    Some(TypeDescriptor {
        min,
        max,
        step: Some(step),
        ..TypeDescriptor::of(TypeKind::Numeric)
    })
}

/// Step implied by a `fractionDigits` facet: 2 → 0.01, 0 → 1.
#[must_use]
pub fn step_from_fraction_digits(digits: u32) -> f64 {
    let exponent = i32::try_from(digits).unwrap_or(i32::MAX);
    10f64.powi(-exponent)
}

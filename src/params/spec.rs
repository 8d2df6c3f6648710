//! Parameter specification types.
//!
//! A [`ParameterSpec`] describes one tunable operator parameter: its kind,
//! its validity domain, and its default value. Specs are constructed once
//! when an operator type is defined, validated eagerly, and shared read-only
//! across all instances of that operator type. The same spec objects later
//! drive strategy derivation for property-based testing.

use serde::{Deserialize, Serialize};

use crate::core::errors::{OpixError, OpixResult};

/// The kind of a parameter, without its domain details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// Integer parameter with inclusive bounds.
    Integer,
    /// Floating-point parameter with inclusive finite bounds.
    Double,
    /// Choice among an ordered set of distinct strings.
    Enum,
    /// Boolean parameter.
    Boolean,
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamKind::Integer => write!(f, "integer"),
            ParamKind::Double => write!(f, "double"),
            ParamKind::Enum => write!(f, "enum"),
            ParamKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// A parameter value, matching one of the [`ParamKind`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// An integer value.
    Integer(i64),
    /// A floating-point value.
    Double(f64),
    /// An enum choice.
    Enum(String),
    /// A boolean value.
    Boolean(bool),
}

impl ParamValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Integer(_) => ParamKind::Integer,
            ParamValue::Double(_) => ParamKind::Double,
            ParamValue::Enum(_) => ParamKind::Enum,
            ParamValue::Boolean(_) => ParamKind::Boolean,
        }
    }

    /// Returns the integer payload, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the floating-point payload, if this is a double value.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            ParamValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the enum choice, if this is an enum value.
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            ParamValue::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean value.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ParamValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Integer(v) => write!(f, "{v}"),
            ParamValue::Double(v) => write!(f, "{v}"),
            ParamValue::Enum(v) => write!(f, "{v}"),
            ParamValue::Boolean(v) => write!(f, "{v}"),
        }
    }
}

/// Immutable description of a parameter's type, valid domain, and default.
///
/// Constructed through the checked constructors ([`ParameterSpec::integer`],
/// [`ParameterSpec::double`], [`ParameterSpec::enumeration`],
/// [`ParameterSpec::boolean`]); a spec with an inverted range or an empty
/// choice list fails at construction and is never usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterSpec {
    /// Integer parameter over an inclusive range.
    Integer {
        /// The inclusive lower bound.
        lower: i64,
        /// The inclusive upper bound.
        upper: i64,
        /// The default value.
        default: i64,
    },
    /// Floating-point parameter over an inclusive finite range.
    Double {
        /// The inclusive lower bound.
        lower: f64,
        /// The inclusive upper bound.
        upper: f64,
        /// The default value.
        default: f64,
    },
    /// Choice among an ordered, non-empty set of distinct strings.
    Enum {
        /// The allowed choices, in declaration order.
        choices: Vec<String>,
        /// The default choice.
        default: String,
    },
    /// Boolean parameter.
    Boolean {
        /// The default value.
        default: bool,
    },
}

impl ParameterSpec {
    /// Creates an integer spec with inclusive bounds.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `lower > upper` or the default lies
    /// outside the bounds.
    pub fn integer(lower: i64, upper: i64, default: i64) -> OpixResult<Self> {
        if lower > upper {
            return Err(OpixError::config(format!(
                "integer spec has inverted bounds: lower {lower} > upper {upper}"
            )));
        }
        if default < lower || default > upper {
            return Err(OpixError::config(format!(
                "integer spec default {default} outside [{lower}, {upper}]"
            )));
        }
        Ok(Self::Integer {
            lower,
            upper,
            default,
        })
    }

    /// Creates a floating-point spec with inclusive finite bounds.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either bound is non-finite, if
    /// `lower > upper`, or if the default lies outside the bounds.
    pub fn double(lower: f64, upper: f64, default: f64) -> OpixResult<Self> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(OpixError::config(format!(
                "double spec bounds must be finite, got [{lower}, {upper}]"
            )));
        }
        if lower > upper {
            return Err(OpixError::config(format!(
                "double spec has inverted bounds: lower {lower} > upper {upper}"
            )));
        }
        if !default.is_finite() || default < lower || default > upper {
            return Err(OpixError::config(format!(
                "double spec default {default} outside [{lower}, {upper}]"
            )));
        }
        Ok(Self::Double {
            lower,
            upper,
            default,
        })
    }

    /// Creates an enum spec over an ordered set of distinct choices.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the choice list is empty, contains
    /// duplicates, or does not contain the default.
    pub fn enumeration<S: Into<String>>(
        choices: impl IntoIterator<Item = S>,
        default: impl Into<String>,
    ) -> OpixResult<Self> {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        let default = default.into();
        if choices.is_empty() {
            return Err(OpixError::config("enum spec has no choices"));
        }
        for (i, choice) in choices.iter().enumerate() {
            if choices[..i].contains(choice) {
                return Err(OpixError::config(format!(
                    "enum spec has duplicate choice '{choice}'"
                )));
            }
        }
        if !choices.contains(&default) {
            return Err(OpixError::config(format!(
                "enum spec default '{default}' not among choices {choices:?}"
            )));
        }
        Ok(Self::Enum { choices, default })
    }

    /// Creates a boolean spec.
    pub fn boolean(default: bool) -> Self {
        Self::Boolean { default }
    }

    /// Returns the kind of this spec.
    pub fn kind(&self) -> ParamKind {
        match self {
            ParameterSpec::Integer { .. } => ParamKind::Integer,
            ParameterSpec::Double { .. } => ParamKind::Double,
            ParameterSpec::Enum { .. } => ParamKind::Enum,
            ParameterSpec::Boolean { .. } => ParamKind::Boolean,
        }
    }

    /// Returns this spec's default value.
    pub fn default_value(&self) -> ParamValue {
        match self {
            ParameterSpec::Integer { default, .. } => ParamValue::Integer(*default),
            ParameterSpec::Double { default, .. } => ParamValue::Double(*default),
            ParameterSpec::Enum { default, .. } => ParamValue::Enum(default.clone()),
            ParameterSpec::Boolean { default } => ParamValue::Boolean(*default),
        }
    }

    /// Returns a human-readable description of this spec's domain.
    pub fn describe(&self) -> String {
        match self {
            ParameterSpec::Integer { lower, upper, .. } => {
                format!("integer in [{lower}, {upper}]")
            }
            ParameterSpec::Double { lower, upper, .. } => {
                format!("double in [{lower}, {upper}]")
            }
            ParameterSpec::Enum { choices, .. } => format!("one of {choices:?}"),
            ParameterSpec::Boolean { .. } => "boolean".to_string(),
        }
    }

    /// Checks that `value` lies in this spec's domain.
    ///
    /// The error message names the expected domain; the caller adds the
    /// parameter name.
    pub fn validate(&self, value: &ParamValue) -> Result<(), String> {
        match (self, value) {
            (ParameterSpec::Integer { lower, upper, .. }, ParamValue::Integer(v)) => {
                if v < lower || v > upper {
                    Err(format!("{v} is not {}", self.describe()))
                } else {
                    Ok(())
                }
            }
            (ParameterSpec::Double { lower, upper, .. }, ParamValue::Double(v)) => {
                if !v.is_finite() {
                    Err(format!("{v} is not finite"))
                } else if v < lower || v > upper {
                    Err(format!("{v} is not {}", self.describe()))
                } else {
                    Ok(())
                }
            }
            (ParameterSpec::Enum { choices, .. }, ParamValue::Enum(v)) => {
                if choices.contains(v) {
                    Ok(())
                } else {
                    Err(format!("'{v}' is not {}", self.describe()))
                }
            }
            (ParameterSpec::Boolean { .. }, ParamValue::Boolean(_)) => Ok(()),
            (spec, value) => Err(format!(
                "expected {} value, got {} value",
                spec.kind(),
                value.kind()
            )),
        }
    }
}

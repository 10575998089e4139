// labforge-core/src/domain/policy/constraint.rs

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::domain::error::DomainError;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Constraint a cluster policy places on one cluster attribute.
///
/// Serialized the way the policy API stores it: the variant becomes the
/// `type` field and the remaining fields are camelCase, e.g.
/// `{"type":"range","minValue":1,"maxValue":180,"defaultValue":120,"hidden":false}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ConstraintDescriptor {
    Fixed {
        value: Value,
        #[serde(default)]
        hidden: bool,
    },
    Range {
        min_value: Number,
        max_value: Number,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_value: Option<Value>,
        #[serde(default)]
        hidden: bool,
    },
    Unlimited {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_value: Option<Value>,
        #[serde(default, skip_serializing_if = "is_false")]
        is_optional: bool,
        #[serde(default)]
        hidden: bool,
    },
}

impl ConstraintDescriptor {
    pub fn fixed(value: impl Into<Value>) -> Self {
        Self::Fixed {
            value: value.into(),
            hidden: false,
        }
    }

    pub fn range(min_value: impl Into<Number>, max_value: impl Into<Number>) -> Self {
        Self::Range {
            min_value: min_value.into(),
            max_value: max_value.into(),
            default_value: None,
            hidden: false,
        }
    }

    pub fn unlimited() -> Self {
        Self::Unlimited {
            default_value: None,
            is_optional: false,
            hidden: false,
        }
    }

    /// Sets the default for `range` and `unlimited`; fixed values have none.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        match &mut self {
            Self::Range { default_value, .. } | Self::Unlimited { default_value, .. } => {
                *default_value = Some(value.into());
            }
            Self::Fixed { .. } => {}
        }
        self
    }

    /// Marks an `unlimited` attribute as optional.
    pub fn optional(mut self) -> Self {
        if let Self::Unlimited { is_optional, .. } = &mut self {
            *is_optional = true;
        }
        self
    }

    pub fn with_hidden(mut self, value: bool) -> Self {
        match &mut self {
            Self::Fixed { hidden, .. } | Self::Range { hidden, .. } | Self::Unlimited { hidden, .. } => {
                *hidden = value;
            }
        }
        self
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Range { .. } => "range",
            Self::Unlimited { .. } => "unlimited",
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Fixed { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Self::Range { default_value, .. } | Self::Unlimited { default_value, .. } => {
                default_value.as_ref()
            }
            Self::Fixed { .. } => None,
        }
    }

    pub fn is_hidden(&self) -> bool {
        match self {
            Self::Fixed { hidden, .. } | Self::Range { hidden, .. } | Self::Unlimited { hidden, .. } => {
                *hidden
            }
        }
    }

    pub fn validate(&self, key: &str) -> Result<(), DomainError> {
        let malformed = |reason: String| DomainError::MalformedDefinition {
            key: key.to_string(),
            reason,
        };

        match self {
            Self::Fixed { value, .. } => {
                if value.is_null() {
                    return Err(malformed("fixed constraint requires a value".into()));
                }
            }
            Self::Range {
                min_value,
                max_value,
                default_value,
                ..
            } => {
                let (min, max) = match (min_value.as_f64(), max_value.as_f64()) {
                    (Some(min), Some(max)) => (min, max),
                    _ => return Err(malformed("range bounds must be finite numbers".into())),
                };
                if min > max {
                    return Err(malformed(format!(
                        "minValue {} is greater than maxValue {}",
                        min_value, max_value
                    )));
                }
                if let Some(default) = default_value {
                    let d = default
                        .as_f64()
                        .ok_or_else(|| malformed(format!("range default {} is not a number", default)))?;
                    if d < min || d > max {
                        return Err(malformed(format!(
                            "defaultValue {} outside [{}, {}]",
                            default, min_value, max_value
                        )));
                    }
                }
            }
            Self::Unlimited { .. } => {}
        }
        Ok(())
    }
}

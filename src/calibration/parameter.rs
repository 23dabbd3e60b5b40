// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Symbolic parameters and template operands.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A symbolic placeholder in a schedule.
///
/// Two parameters are equal only when they share an id, so a fresh
/// `Parameter::new("β")` never aliases another parameter named `β`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    id: Uuid,
}

impl Parameter {
    /// Create a fresh parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Uuid::new_v4(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Operand of a stored schedule template: a literal or a calibration
/// parameter name resolved against the store.
///
/// Serialized untagged, so YAML templates read `amp: 0.2` or `amp: "amp"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamExpr {
    Value(f64),
    Parameter(String),
}

impl ParamExpr {
    /// Name of the referenced calibration parameter, if any.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            ParamExpr::Value(_) => None,
            ParamExpr::Parameter(name) => Some(name),
        }
    }
}

impl From<f64> for ParamExpr {
    fn from(value: f64) -> Self {
        ParamExpr::Value(value)
    }
}

impl From<&str> for ParamExpr {
    fn from(name: &str) -> Self {
        ParamExpr::Parameter(name.to_string())
    }
}

/// Operand of a resolved schedule: bound value or free symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(f64),
    Symbol(Parameter),
}

impl Operand {
    pub fn value(&self) -> Option<f64> {
        match self {
            Operand::Value(v) => Some(*v),
            Operand::Symbol(_) => None,
        }
    }

    pub fn symbol(&self) -> Option<&Parameter> {
        match self {
            Operand::Value(_) => None,
            Operand::Symbol(p) => Some(p),
        }
    }
}

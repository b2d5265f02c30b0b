//! Configuration files.
//!
//! A scenario file declares a type lattice, registration defaults, the
//! implementations to register and the calls to resolve:
//!
//! ```toml
//! [defaults]
//! priority = 0
//! expand_permutations = false
//!
//! [[lattice.types]]
//! name = "Number"
//!
//! [[lattice.types]]
//! name = "Integer"
//! parents = ["Number"]
//!
//! [lattice.aliases]
//! Number = ["Integer"]
//!
//! [[register]]
//! point = "add"
//! implementation = "add_numbers"
//! params = [
//!     { name = "a", type = "Number" },
//!     { name = "b", type = { any_of = ["Number", "str"] }, default = 0 },
//! ]
//!
//! [[call]]
//! point = "add"
//! args = ["Integer", "Integer"]
//! ```
//!
//! Type names resolve against the lattice: builtins (`object`, `int`,
//! `str`, ...), declared types, `Any` and, in parameter position, `Self`.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candidate::{ParamKind, Parameter};
use crate::dispatch::RegisterOptions;
use crate::lattice::{AliasTable, Hierarchy, Placeholder, TypeDesc, TypeExpr, Value, Variance};

/// Name of the enclosing type in parameter annotations.
pub const SELF_NAME: &str = "Self";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown type `{name}`")]
    UnknownType { name: String },

    #[error("type `{name}` is declared more than once")]
    DuplicateType { name: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A complete scenario file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Registration defaults.
    pub defaults: DefaultsConfig,

    /// The type lattice.
    pub lattice: LatticeConfig,

    /// Implementations to register, in order.
    pub register: Vec<RegistrationConfig>,

    /// Calls to resolve, in order.
    pub call: Vec<CallConfig>,
}

impl ScenarioConfig {
    /// Load a scenario from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Defaults applied to every registration that does not override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Base priority of registered candidates.
    pub priority: i64,

    /// Register every argument-order permutation.
    pub expand_permutations: bool,

    /// Type of unannotated parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<TypeSpec>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            priority: 0,
            expand_permutations: false,
            fallback: None,
        }
    }
}

/// Declared types and widening aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    /// Types, declared in order. Parents must be declared first.
    pub types: Vec<TypeDecl>,

    /// Widening aliases: a type and the further types it accepts.
    pub aliases: IndexMap<String, Vec<String>>,
}

/// One declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
}

impl LatticeConfig {
    /// Build the hierarchy and alias table.
    pub fn build(&self) -> ConfigResult<(Hierarchy, AliasTable)> {
        let mut hierarchy = Hierarchy::new();
        for decl in &self.types {
            if hierarchy.lookup(&decl.name).is_some() || decl.name == SELF_NAME {
                return Err(ConfigError::DuplicateType {
                    name: decl.name.clone(),
                });
            }
            let parents = decl
                .parents
                .iter()
                .map(|p| concrete(&hierarchy, p))
                .collect::<ConfigResult<Vec<_>>>()?;
            hierarchy.declare(&decl.name, &parents);
        }

        let mut aliases = AliasTable::builder();
        for (name, accepted) in &self.aliases {
            let ty = concrete(&hierarchy, name)?;
            let accepted = accepted
                .iter()
                .map(|a| concrete(&hierarchy, a))
                .collect::<ConfigResult<Vec<_>>>()?;
            aliases = aliases.widen(ty, accepted);
        }

        Ok((hierarchy, aliases.build()))
    }
}

/// One implementation to register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Dispatch point name.
    pub point: String,

    /// Implementation name.
    pub implementation: String,

    #[serde(default)]
    pub params: Vec<ParamConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    /// Overrides `defaults.expand_permutations`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permute: Option<bool>,

    /// The type `Self` refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_type: Option<String>,

    /// Overrides `defaults.fallback`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<TypeSpec>,

    /// Source name for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl RegistrationConfig {
    /// Registration options, falling back to `defaults`.
    pub fn options(&self, defaults: &DefaultsConfig, hierarchy: &Hierarchy) -> ConfigResult<RegisterOptions> {
        let fallback = match self.fallback.as_ref().or(defaults.fallback.as_ref()) {
            Some(spec) => Some(spec.to_expr(hierarchy)?),
            None => None,
        };
        Ok(RegisterOptions {
            priority: self.priority.unwrap_or(defaults.priority),
            fallback,
            self_type: self
                .self_type
                .as_deref()
                .map(|name| concrete(hierarchy, name))
                .transpose()?,
            expand_permutations: self.permute.unwrap_or(defaults.expand_permutations),
            source_name: self.source.clone(),
        })
    }

    /// The declared parameters.
    pub fn parameters(&self, hierarchy: &Hierarchy) -> ConfigResult<Vec<Parameter>> {
        self.params.iter().map(|p| p.to_parameter(hierarchy)).collect()
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamConfig {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeSpec>,

    #[serde(default)]
    pub kind: ParamKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ValueSpec>,
}

impl ParamConfig {
    pub fn to_parameter(&self, hierarchy: &Hierarchy) -> ConfigResult<Parameter> {
        Ok(Parameter {
            name: self.name.clone(),
            kind: self.kind,
            annotation: self.ty.as_ref().map(|t| t.to_expr(hierarchy)).transpose()?,
            default: self.default.as_ref().map(|v| v.to_value(hierarchy)).transpose()?,
        })
    }
}

/// One call to resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallConfig {
    pub point: String,

    /// Argument type names.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CallConfig {
    pub fn arg_types(&self, hierarchy: &Hierarchy) -> ConfigResult<Vec<TypeDesc>> {
        self.args.iter().map(|a| lookup(hierarchy, a)).collect()
    }
}

/// A type expression as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    /// A type name, `Any` or `Self`.
    Name(String),
    AnyOf {
        any_of: Vec<TypeSpec>,
    },
    Literal {
        literal: Vec<ValueSpec>,
    },
    Placeholder {
        placeholder: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bound: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        constraints: Vec<String>,
        #[serde(default)]
        variance: Variance,
    },
}

impl TypeSpec {
    pub fn to_expr(&self, hierarchy: &Hierarchy) -> ConfigResult<TypeExpr> {
        match self {
            TypeSpec::Name(name) if name == SELF_NAME => Ok(TypeExpr::SelfType),
            TypeSpec::Name(name) => Ok(lookup(hierarchy, name)?.into()),
            TypeSpec::AnyOf { any_of } => Ok(TypeExpr::Alternative(
                any_of
                    .iter()
                    .map(|t| t.to_expr(hierarchy))
                    .collect::<ConfigResult<_>>()?,
            )),
            TypeSpec::Literal { literal } => Ok(TypeExpr::Literal(
                literal
                    .iter()
                    .map(|v| v.to_value(hierarchy))
                    .collect::<ConfigResult<_>>()?,
            )),
            TypeSpec::Placeholder {
                placeholder,
                bound,
                constraints,
                variance,
            } => {
                let mut p = Placeholder::new(placeholder.as_str()).with_variance(*variance);
                if let Some(bound) = bound {
                    p = p.bounded(concrete(hierarchy, bound)?);
                }
                let constraints = constraints
                    .iter()
                    .map(|c| concrete(hierarchy, c))
                    .collect::<ConfigResult<Vec<_>>>()?;
                Ok(p.constrained(constraints).into())
            }
        }
    }
}

/// A host value as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Sentinel { sentinel: Sentinel },
    /// An opaque object of the named type.
    Object { object: String },
}

/// Singleton values TOML has no literal for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentinel {
    None,
    Ellipsis,
    NotImplemented,
}

impl ValueSpec {
    pub fn to_value(&self, hierarchy: &Hierarchy) -> ConfigResult<Value> {
        Ok(match self {
            ValueSpec::Bool(b) => Value::Bool(*b),
            ValueSpec::Int(i) => Value::Int(*i),
            ValueSpec::Float(f) => Value::Float(OrderedFloat(*f)),
            ValueSpec::Str(s) => Value::Str(s.clone()),
            ValueSpec::Sentinel { sentinel } => match sentinel {
                Sentinel::None => Value::None,
                Sentinel::Ellipsis => Value::Ellipsis,
                Sentinel::NotImplemented => Value::NotImplemented,
            },
            ValueSpec::Object { object } => Value::Object(concrete(hierarchy, object)?),
        })
    }
}

fn lookup(hierarchy: &Hierarchy, name: &str) -> ConfigResult<TypeDesc> {
    hierarchy.lookup(name).ok_or_else(|| ConfigError::UnknownType {
        name: name.to_string(),
    })
}

/// Like [`lookup`], but `Any` is not accepted.
fn concrete(hierarchy: &Hierarchy, name: &str) -> ConfigResult<TypeDesc> {
    match lookup(hierarchy, name)? {
        ty if ty.is_any() => Err(ConfigError::UnknownType {
            name: name.to_string(),
        }),
        ty => Ok(ty),
    }
}

//! Running a scenario and describing the outcome.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use plexa::config::ConfigResult;
use plexa::lattice::TypeOracle;
use plexa::{DispatchResult, Hierarchy, ImplRef, Registry, ScenarioConfig, TypeDesc};

/// Everything a scenario run produced.
#[derive(Debug, Serialize)]
pub struct Report {
    pub registrations: Vec<RegistrationReport>,
    pub calls: Vec<CallReport>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationReport {
    pub point: String,
    pub implementation: String,
    #[serde(flatten)]
    pub outcome: RegistrationOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    Registered {
        built: usize,
        inserted: usize,
        replaced: usize,
        kept_existing: usize,
    },
    Rejected {
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct CallReport {
    pub point: String,
    pub args: Vec<String>,
    #[serde(flatten)]
    pub outcome: CallOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallOutcome {
    Resolved {
        implementation: String,
        signature: Vec<String>,
        permuted: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
    NoMatch,
    Ambiguous {
        candidates: Vec<String>,
    },
}

impl Report {
    /// Whether every registration was accepted and every call resolved.
    pub fn is_clean(&self) -> bool {
        self.registrations
            .iter()
            .all(|r| matches!(r.outcome, RegistrationOutcome::Registered { .. }))
            && self.calls.iter().all(|c| matches!(c.outcome, CallOutcome::Resolved { .. }))
    }
}

/// Register every implementation of `scenario`, then resolve every call.
///
/// Rejected registrations are reported, not fatal. Unknown type names are.
pub fn run(scenario: &ScenarioConfig) -> ConfigResult<Report> {
    let (hierarchy, aliases) = scenario.lattice.build()?;
    let mut registry = Registry::new(aliases, hierarchy.clone());

    let mut registrations = Vec::with_capacity(scenario.register.len());
    for (index, reg) in scenario.register.iter().enumerate() {
        let options = reg.options(&scenario.defaults, &hierarchy)?;
        let params = reg.parameters(&hierarchy)?;
        let implementation = ImplRef::new(index as u32, reg.implementation.as_str());

        let outcome = match registry.register(&reg.point, implementation, &params, &options) {
            Ok(summary) => RegistrationOutcome::Registered {
                built: summary.built,
                inserted: summary.inserted,
                replaced: summary.replaced,
                kept_existing: summary.kept_existing,
            },
            Err(err) => RegistrationOutcome::Rejected { error: err.to_string() },
        };
        registrations.push(RegistrationReport {
            point: reg.point.clone(),
            implementation: reg.implementation.clone(),
            outcome,
        });
    }
    info!(count = registrations.len(), "processed registrations");

    let mut calls = Vec::with_capacity(scenario.call.len());
    for call in &scenario.call {
        let args = call.arg_types(&hierarchy)?;
        debug!(point = %call.point, args = ?call.args, "resolving");
        let outcome = match registry.resolve(&call.point, &args) {
            DispatchResult::Resolved(candidate) => CallOutcome::Resolved {
                implementation: candidate.implementation().target().name.to_string(),
                signature: names(&hierarchy, candidate.param_types()),
                permuted: candidate.priority().permuted,
                source: candidate.source_name().map(str::to_string),
            },
            DispatchResult::NoMatch(_) => CallOutcome::NoMatch,
            DispatchResult::Ambiguous(err) => CallOutcome::Ambiguous {
                candidates: err
                    .candidates
                    .iter()
                    .map(|c| {
                        format!(
                            "{}({})",
                            c.implementation().target(),
                            names(&hierarchy, c.param_types()).join(", ")
                        )
                    })
                    .collect(),
            },
        };
        calls.push(CallReport {
            point: call.point.clone(),
            args: call.args.clone(),
            outcome,
        });
    }

    Ok(Report { registrations, calls })
}

fn names(hierarchy: &Hierarchy, types: &[TypeDesc]) -> Vec<String> {
    types.iter().map(|&t| hierarchy.type_name(t)).collect()
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.registrations {
            match &r.outcome {
                RegistrationOutcome::Registered {
                    built,
                    inserted,
                    replaced,
                    kept_existing,
                } => writeln!(
                    f,
                    "register {}::{}: {} built, {} inserted, {} replaced, {} kept existing",
                    r.point, r.implementation, built, inserted, replaced, kept_existing
                )?,
                RegistrationOutcome::Rejected { error } => {
                    writeln!(f, "register {}::{}: rejected: {}", r.point, r.implementation, error)?
                }
            }
        }
        for c in &self.calls {
            write!(f, "call {}({}): ", c.point, c.args.join(", "))?;
            match &c.outcome {
                CallOutcome::Resolved {
                    implementation,
                    signature,
                    permuted,
                    ..
                } => {
                    write!(f, "{}({})", implementation, signature.join(", "))?;
                    if *permuted {
                        write!(f, " [permuted]")?;
                    }
                    writeln!(f)?;
                }
                CallOutcome::NoMatch => writeln!(f, "no applicable candidate")?,
                CallOutcome::Ambiguous { candidates } => {
                    writeln!(f, "ambiguous between {}", candidates.join(" and "))?
                }
            }
        }
        Ok(())
    }
}

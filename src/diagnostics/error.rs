use std::fmt;

use crate::diagnostics::error_codes::{self, ErrorCode};
use crate::runtime::tag::Tag;
use crate::runtime::value::Value;

/// Site held responsible for a contract violation.
///
/// Preconditions blame the call site that supplied the bad argument;
/// postconditions blame the definition that produced the bad result.
#[derive(Debug, Clone, PartialEq)]
pub enum Blame {
    Caller(String),
    Definition(String),
}

impl fmt::Display for Blame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blame::Caller(site) => write!(f, "caller at {}", site),
            Blame::Definition(site) => write!(f, "definition at {}", site),
        }
    }
}

/// Runtime failure, one variant per taxonomy entry.
///
/// All failures are fatal to the operation that raised them; nothing is
/// retried inside the runtime. Message text for the user-facing variants
/// is a compatibility surface: host tooling matches on the prefixes, so
/// wording changes are breaking changes.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    DuplicateField {
        field: String,
    },
    NoSuchField {
        field: String,
    },
    MissingMethods {
        protocol: String,
        type_tag: Tag,
        missing: Vec<String>,
    },
    ExtraneousMethods {
        protocol: String,
        type_tag: Tag,
        extraneous: Vec<String>,
    },
    RequirementConflict {
        protocol: String,
        parent: String,
        conflicts: Vec<String>,
    },
    UnsatisfiedParent {
        parent: String,
        type_tag: Tag,
    },
    DivergingProtocols {
        left: String,
        right: String,
    },
    SealedAdt {
        adt: String,
        variant: String,
    },
    UnknownVariant {
        adt: String,
        variant: String,
    },
    UnknownProtocol {
        tag: Tag,
    },
    NoImplementation {
        protocol: String,
        type_tag: Tag,
    },
    NotATask {
        actual: Tag,
    },
    ContractViolation {
        contract: String,
        actual: String,
        site: String,
        blame: Blame,
    },
    UncaughtThrow(Value),
    WrongArity {
        callable: String,
        expected: usize,
        got: usize,
    },
    TaskAlreadyRun,
}

impl RuntimeError {
    pub fn code(&self) -> &'static ErrorCode {
        match self {
            RuntimeError::DuplicateField { .. } => &error_codes::DUPLICATE_FIELD,
            RuntimeError::NoSuchField { .. } => &error_codes::NO_SUCH_FIELD,
            RuntimeError::MissingMethods { .. } => &error_codes::MISSING_METHODS,
            RuntimeError::ExtraneousMethods { .. } => &error_codes::EXTRANEOUS_METHODS,
            RuntimeError::RequirementConflict { .. } => &error_codes::REQUIREMENT_CONFLICT,
            RuntimeError::UnsatisfiedParent { .. } => &error_codes::UNSATISFIED_PARENT,
            RuntimeError::DivergingProtocols { .. } => &error_codes::DIVERGING_PROTOCOLS,
            RuntimeError::SealedAdt { .. } => &error_codes::SEALED_ADT,
            RuntimeError::UnknownVariant { .. } => &error_codes::UNKNOWN_VARIANT,
            RuntimeError::UnknownProtocol { .. } => &error_codes::UNKNOWN_PROTOCOL,
            RuntimeError::NoImplementation { .. } => &error_codes::NO_IMPLEMENTATION,
            RuntimeError::NotATask { .. } => &error_codes::NOT_A_TASK,
            RuntimeError::ContractViolation { .. } => &error_codes::CONTRACT_VIOLATION,
            RuntimeError::UncaughtThrow(_) => &error_codes::UNCAUGHT_THROW,
            RuntimeError::WrongArity { .. } => &error_codes::WRONG_ARITY,
            RuntimeError::TaskAlreadyRun => &error_codes::TASK_ALREADY_RUN,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::DuplicateField { field } => {
                write!(f, "Field is already bound: {}", field)
            }
            RuntimeError::NoSuchField { field } => {
                write!(f, "No such field: {}", field)
            }
            RuntimeError::MissingMethods {
                protocol,
                type_tag,
                missing,
            } => {
                write!(
                    f,
                    "{} doesn't implement all requisites of {}.\nMissing methods: {}",
                    type_tag,
                    protocol,
                    missing.join(", ")
                )
            }
            RuntimeError::ExtraneousMethods {
                protocol,
                type_tag,
                extraneous,
            } => {
                write!(
                    f,
                    "{} implements methods that are not requisites of {}.\nExtraneous methods: {}",
                    type_tag,
                    protocol,
                    extraneous.join(", ")
                )
            }
            RuntimeError::RequirementConflict {
                protocol,
                parent,
                conflicts,
            } => {
                write!(
                    f,
                    "{} can't extend {} because the following requirements conflict: {}",
                    protocol,
                    parent,
                    conflicts.join(", ")
                )
            }
            RuntimeError::UnsatisfiedParent { parent, type_tag } => {
                write!(
                    f,
                    "No implementation of the required interface {} was found for {}.",
                    parent, type_tag
                )
            }
            RuntimeError::DivergingProtocols { left, right } => {
                write!(
                    f,
                    "Can't merge diverging protocols {} and {}.",
                    left, right
                )
            }
            RuntimeError::SealedAdt { adt, variant } => {
                write!(
                    f,
                    "Trying to add the constructor {} to the sealed ADT {}.",
                    variant, adt
                )
            }
            RuntimeError::UnknownVariant { adt, variant } => {
                write!(f, "Unknown variant {} for {}.", variant, adt)
            }
            RuntimeError::UnknownProtocol { tag } => {
                write!(f, "No protocol registered under {}.", tag)
            }
            RuntimeError::NoImplementation { protocol, type_tag } => {
                write!(
                    f,
                    "No available implementations of {} for: {}",
                    protocol, type_tag
                )
            }
            RuntimeError::NotATask { actual } => {
                write!(f, "`main` must return a Task, got: {}", actual)
            }
            RuntimeError::ContractViolation {
                contract,
                actual,
                site,
                blame,
            } => {
                write!(
                    f,
                    "Contract violation: expected {} actual: {}\n  at {}\n  blame: {}",
                    contract, actual, site, blame
                )
            }
            RuntimeError::UncaughtThrow(error) => {
                write!(f, "Uncaught Throw: {}", error.describe())
            }
            RuntimeError::WrongArity {
                callable,
                expected,
                got,
            } => {
                write!(
                    f,
                    "{} expects {} arguments, got {}",
                    callable, expected, got
                )
            }
            RuntimeError::TaskAlreadyRun => {
                write!(f, "Task has already been run.")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

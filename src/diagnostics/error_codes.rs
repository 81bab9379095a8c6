#[derive(Debug, Clone, Copy)]
pub struct ErrorCode {
    pub code: &'static str,
    pub title: &'static str,
}

pub const DUPLICATE_FIELD: ErrorCode = ErrorCode {
    code: "R001",
    title: "DUPLICATE FIELD",
};
pub const NO_SUCH_FIELD: ErrorCode = ErrorCode {
    code: "R002",
    title: "NO SUCH FIELD",
};
pub const MISSING_METHODS: ErrorCode = ErrorCode {
    code: "R003",
    title: "MISSING METHODS",
};
pub const EXTRANEOUS_METHODS: ErrorCode = ErrorCode {
    code: "R004",
    title: "EXTRANEOUS METHODS",
};
pub const REQUIREMENT_CONFLICT: ErrorCode = ErrorCode {
    code: "R005",
    title: "REQUIREMENT CONFLICT",
};
pub const UNSATISFIED_PARENT: ErrorCode = ErrorCode {
    code: "R006",
    title: "UNSATISFIED PARENT",
};
pub const DIVERGING_PROTOCOLS: ErrorCode = ErrorCode {
    code: "R007",
    title: "DIVERGING PROTOCOLS",
};
pub const NO_IMPLEMENTATION: ErrorCode = ErrorCode {
    code: "R008",
    title: "NO IMPLEMENTATION",
};
pub const SEALED_ADT: ErrorCode = ErrorCode {
    code: "R009",
    title: "SEALED ADT",
};
pub const UNKNOWN_VARIANT: ErrorCode = ErrorCode {
    code: "R010",
    title: "UNKNOWN VARIANT",
};
pub const UNKNOWN_PROTOCOL: ErrorCode = ErrorCode {
    code: "R011",
    title: "UNKNOWN PROTOCOL",
};
pub const NOT_A_TASK: ErrorCode = ErrorCode {
    code: "R012",
    title: "NOT A TASK",
};
pub const CONTRACT_VIOLATION: ErrorCode = ErrorCode {
    code: "R013",
    title: "CONTRACT VIOLATION",
};
pub const UNCAUGHT_THROW: ErrorCode = ErrorCode {
    code: "R014",
    title: "UNCAUGHT THROW",
};
pub const WRONG_ARITY: ErrorCode = ErrorCode {
    code: "R015",
    title: "WRONG ARITY",
};
pub const TASK_ALREADY_RUN: ErrorCode = ErrorCode {
    code: "R016",
    title: "TASK ALREADY RUN",
};

/// Every runtime error code, in ascending code order.
///
/// The registry is the contract consumed by host tooling; the guard test
/// asserts ordering and uniqueness so codes never drift or collide.
pub fn all_codes() -> &'static [&'static ErrorCode] {
    &[
        &DUPLICATE_FIELD,
        &NO_SUCH_FIELD,
        &MISSING_METHODS,
        &EXTRANEOUS_METHODS,
        &REQUIREMENT_CONFLICT,
        &UNSATISFIED_PARENT,
        &DIVERGING_PROTOCOLS,
        &NO_IMPLEMENTATION,
        &SEALED_ADT,
        &UNKNOWN_VARIANT,
        &UNKNOWN_PROTOCOL,
        &NOT_A_TASK,
        &CONTRACT_VIOLATION,
        &UNCAUGHT_THROW,
        &WRONG_ARITY,
        &TASK_ALREADY_RUN,
    ]
}

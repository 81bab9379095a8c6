use crate::diagnostics::error::{Blame, RuntimeError};
use crate::runtime::native_function::NativeFunction;
use crate::runtime::value::Value;

/// Checks a precondition: the predicate is applied to the value supplied
/// at `call_site`, and a non-truthy answer blames that call site: the
/// caller handed over a bad argument.
pub fn check_precondition(
    predicate: &NativeFunction,
    value: &Value,
    definition_site: &str,
    call_site: &str,
) -> Result<(), RuntimeError> {
    check(
        predicate,
        value,
        definition_site,
        Blame::Caller(call_site.to_string()),
    )
}

/// Checks a postcondition: a non-truthy answer blames the definition
/// site: the implementation produced a bad result.
pub fn check_postcondition(
    predicate: &NativeFunction,
    value: &Value,
    definition_site: &str,
) -> Result<(), RuntimeError> {
    check(
        predicate,
        value,
        definition_site,
        Blame::Definition(definition_site.to_string()),
    )
}

fn check(
    predicate: &NativeFunction,
    value: &Value,
    definition_site: &str,
    blame: Blame,
) -> Result<(), RuntimeError> {
    let verdict = predicate.call(vec![value.clone()])?;
    if verdict.is_truthy() {
        return Ok(());
    }
    Err(RuntimeError::ContractViolation {
        contract: predicate.name().to_string(),
        actual: value.describe(),
        site: definition_site.to_string(),
        blame,
    })
}

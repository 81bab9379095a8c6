use std::cell::Cell;
use std::rc::Rc;

use sable::diagnostics::RuntimeError;
use sable::runtime::{
    NativeFunction, Namespace, Outcome, ProgramOutcome, Tag, Task, Value, run_program,
};

fn namespace_with_main<C>(make_outcome: C) -> (Namespace, Rc<Cell<u32>>)
where
    C: Fn() -> Outcome + Clone + 'static,
{
    let cleanups = Rc::new(Cell::new(0));
    let counter = Rc::clone(&cleanups);
    let ns = Namespace::root("app");
    ns.define(
        "main",
        Value::Function(NativeFunction::new("main", move |_| {
            let make_outcome = make_outcome.clone();
            let counter = Rc::clone(&counter);
            Ok(Task::new(
                move || make_outcome(),
                move || counter.set(counter.get() + 1),
            )
            .into_value())
        })),
    )
    .unwrap();
    (ns, cleanups)
}

#[test]
fn done_completes_without_a_value_and_cleans_up_once() {
    let (ns, cleanups) = namespace_with_main(|| Outcome::Done);
    let outcome = run_program(&ns, vec![]).unwrap();
    assert_eq!(outcome, ProgramOutcome::Completed);
    assert_eq!(cleanups.get(), 1);
}

#[test]
fn yield_completes_with_the_payload() {
    let (ns, cleanups) = namespace_with_main(|| Outcome::Yield(Value::Integer(42)));
    let outcome = run_program(&ns, vec![]).unwrap();
    assert_eq!(outcome, ProgramOutcome::Yielded(Value::Integer(42)));
    assert_eq!(cleanups.get(), 1);
}

#[test]
fn throw_is_reraised_with_the_exact_error_value_after_cleanup() {
    let (ns, cleanups) = namespace_with_main(|| Outcome::Throw(Value::String("boom".into())));
    let err = run_program(&ns, vec![]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::UncaughtThrow(Value::String("boom".into()))
    );
    assert_eq!(cleanups.get(), 1);
}

#[test]
fn main_receives_the_argument_array() {
    let ns = Namespace::root("app");
    ns.define(
        "main",
        Value::Function(NativeFunction::new("main", |args| {
            let Some(Value::Array(argv)) = args.first().cloned() else {
                panic!("expected the argument array");
            };
            Ok(
                Task::of(move || Outcome::Yield(Value::Integer(argv.len() as i64)))
                    .into_value(),
            )
        })),
    )
    .unwrap();

    let outcome = run_program(
        &ns,
        vec![Value::String("a".into()), Value::String("b".into())],
    )
    .unwrap();
    assert_eq!(outcome, ProgramOutcome::Yielded(Value::Integer(2)));
}

#[test]
fn missing_main_is_a_field_error() {
    let ns = Namespace::root("app");
    let err = run_program(&ns, vec![]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::NoSuchField {
            field: "main".to_string()
        }
    );
}

#[test]
fn non_callable_main_is_not_a_task() {
    let ns = Namespace::root("app");
    ns.define("main", Value::Integer(1)).unwrap();
    let err = run_program(&ns, vec![]).unwrap_err();
    assert_eq!(err, RuntimeError::NotATask { actual: Tag::Number });
}

#[test]
fn main_returning_a_non_task_is_rejected_with_its_tag() {
    let ns = Namespace::root("app");
    ns.define(
        "main",
        Value::Function(NativeFunction::new("main", |_| {
            Ok(Value::String("not a task".into()))
        })),
    )
    .unwrap();

    let err = run_program(&ns, vec![]).unwrap_err();
    assert_eq!(err, RuntimeError::NotATask { actual: Tag::Text });
    assert_eq!(err.to_string(), "`main` must return a Task, got: string");
}

#[test]
fn errors_raised_by_main_itself_propagate() {
    let ns = Namespace::root("app");
    ns.define(
        "main",
        Value::Function(NativeFunction::new("main", |_| {
            Err(RuntimeError::NoSuchField {
                field: "config".to_string(),
            })
        })),
    )
    .unwrap();

    let err = run_program(&ns, vec![]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::NoSuchField {
            field: "config".to_string()
        }
    );
}

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::diagnostics::error::RuntimeError;
use crate::runtime::namespace::Namespace;
use crate::runtime::value::{Value, tag_of};

/// Result of driving a task's computation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Success, no payload.
    Done,
    /// Success, with payload.
    Yield(Value),
    /// Failure; the driver re-raises the carried error value.
    Throw(Value),
}

/// Result of running a whole program.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramOutcome {
    Completed,
    Yielded(Value),
}

/// Deferred computation paired with a cleanup step.
///
/// The computation runs at most once, driven by [`run_program`]. The
/// cleanup runs exactly once, strictly before the driver observes the
/// outcome, on every path, including unwinding out of the computation.
pub struct Task {
    computation: RefCell<Option<Box<dyn FnOnce() -> Outcome>>>,
    cleanup: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Task {
    pub fn new<C, F>(computation: C, cleanup: F) -> Self
    where
        C: FnOnce() -> Outcome + 'static,
        F: FnOnce() + 'static,
    {
        Self {
            computation: RefCell::new(Some(Box::new(computation))),
            cleanup: RefCell::new(Some(Box::new(cleanup))),
        }
    }

    /// A task with no cleanup step.
    pub fn of<C>(computation: C) -> Self
    where
        C: FnOnce() -> Outcome + 'static,
    {
        Self::new(computation, || {})
    }

    pub fn into_value(self) -> Value {
        Value::Task(Rc::new(self))
    }

    /// Drives the computation to its outcome.
    ///
    /// The cleanup guard runs when the computation finishes or unwinds;
    /// the outcome is only returned after the guard has fired. A task can
    /// be driven once; a second attempt is refused rather than silently
    /// skipping the already-consumed cleanup.
    pub fn run(&self) -> Result<Outcome, RuntimeError> {
        let computation = self
            .computation
            .borrow_mut()
            .take()
            .ok_or(RuntimeError::TaskAlreadyRun)?;
        let guard = CleanupGuard {
            cleanup: self.cleanup.borrow_mut().take(),
        };
        let outcome = computation();
        drop(guard);
        Ok(outcome)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.computation.borrow().is_some() {
            "pending"
        } else {
            "spent"
        };
        write!(f, "Task({})", state)
    }
}

struct CleanupGuard {
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// Runs a compiled program: the single entry point of the runtime.
///
/// Validates that every implementation in the tree's protocol tables
/// satisfies its protocol's parents (deferred from registration because
/// the parent chain is only final after linking), obtains the root
/// `main` binding, calls it with the argument array, and drives the
/// resulting task. A `Throw` outcome is re-raised as the program's fatal
/// error, never swallowed; the host prints it and exits non-zero.
pub fn run_program(root: &Namespace, args: Vec<Value>) -> Result<ProgramOutcome, RuntimeError> {
    validate_protocols(root)?;

    let main = root.get("main")?;
    let Value::Function(main) = main else {
        return Err(RuntimeError::NotATask {
            actual: tag_of(&main),
        });
    };

    let produced = main.call(vec![Value::Array(Rc::new(args))])?;
    let Value::Task(task) = produced else {
        return Err(RuntimeError::NotATask {
            actual: tag_of(&produced),
        });
    };

    match task.run()? {
        Outcome::Done => Ok(ProgramOutcome::Completed),
        Outcome::Yield(value) => Ok(ProgramOutcome::Yielded(value)),
        Outcome::Throw(error) => Err(RuntimeError::UncaughtThrow(error)),
    }
}

fn validate_protocols(ns: &Namespace) -> Result<(), RuntimeError> {
    for entry in ns.protocol_entries() {
        entry.protocol.validate_parents()?;
    }
    for child in ns.children() {
        validate_protocols(&child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn cleanup_runs_before_the_outcome_is_observed() {
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let in_body = Rc::clone(&order);
        let in_cleanup = Rc::clone(&order);
        let task = Task::new(
            move || {
                in_body.borrow_mut().push("body");
                Outcome::Done
            },
            move || in_cleanup.borrow_mut().push("cleanup"),
        );

        let outcome = task.run().unwrap();
        order.borrow_mut().push("observed");

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(*order.borrow(), vec!["body", "cleanup", "observed"]);
    }

    #[test]
    fn cleanup_runs_exactly_once_on_throw() {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let task = Task::new(
            || Outcome::Throw(Value::String("boom".into())),
            move || counter.set(counter.get() + 1),
        );

        let outcome = task.run().unwrap();
        assert_eq!(outcome, Outcome::Throw(Value::String("boom".into())));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn second_run_is_refused_and_cleanup_not_repeated() {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let task = Task::new(|| Outcome::Done, move || counter.set(counter.get() + 1));

        task.run().unwrap();
        assert_eq!(task.run().unwrap_err(), RuntimeError::TaskAlreadyRun);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn cleanup_runs_when_the_computation_unwinds() {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let task = Task::new(
            || -> Outcome { panic!("computation died") },
            move || counter.set(counter.get() + 1),
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| task.run()));
        assert!(result.is_err());
        assert_eq!(runs.get(), 1);
    }
}

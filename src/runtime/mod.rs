//! Runtime core: the primitives compiled Sable programs link against.
//!
//! Values are immutable after creation and shared with `Rc`; the value
//! graph must stay acyclic for reference counting to reclaim it. The
//! runtime is single-threaded and cooperative: the only suspension
//! point is the task driver, and module linking completes before any
//! program code runs.

pub mod adt;
pub mod builtins;
pub mod contract;
pub mod linker;
pub mod namespace;
pub mod native_function;
pub mod protocol;
pub mod record;
pub mod tag;
pub mod task;
pub mod value;

pub use adt::{Adt, DataValue};
pub use linker::{Linker, link};
pub use namespace::Namespace;
pub use native_function::NativeFunction;
pub use protocol::{MethodTable, Protocol};
pub use record::Record;
pub use tag::Tag;
pub use task::{Outcome, ProgramOutcome, Task, run_program};
pub use value::{Value, tag_of};

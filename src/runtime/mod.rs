//! Runtime: the tagged value model, memory subsystem, printer and
//! evaluator.

pub mod eval;
pub mod mem;
pub mod printer;
pub mod value;

pub use eval::{EvalError, Evaluator, RuntimeError, MAX_RECURSION_DEPTH};
pub use mem::{MemError, MemoryConfig, ObjectHeap, RootId};
pub use value::{BuiltinKind, OperatorKind, Value, ValueRef};

//! chibi-lisp: a small Lisp runtime on a fixed-capacity memory subsystem.
//!
//! The interesting part is the memory model in [`runtime::mem`]: a slot
//! pool with bitmap occupancy tracking, a chunked byte heap for string and
//! symbol payloads, and a mark-and-sweep collector driven by an explicit
//! root set. Everything is index-addressed; there is no unsafe code and no
//! pointer arithmetic anywhere in the crate.
//!
//! On top of that sit a reader ([`syntax`]) and an evaluator
//! ([`runtime::eval`]) for a minimal Lisp with arithmetic, comparison,
//! printing and a `dotimes` loop.

pub mod diagnostics;
pub mod runtime;
pub mod syntax;

pub use runtime::{Evaluator, MemoryConfig, ObjectHeap, Value, ValueRef};

use std::fmt;

use crate::runtime::eval::RuntimeError;
use crate::runtime::mem::byte_heap::HeapPtr;
use crate::runtime::mem::heap::ObjectHeap;
use crate::runtime::mem::slot_pool::SlotRef;

/// Native function signature for [`Value::NativeFunction`].
///
/// Receives the already-evaluated argument list (a heap-resident cons chain)
/// and produces a result or a runtime failure.
pub type NativeFn = fn(&mut ObjectHeap, ValueRef) -> Result<ValueRef, RuntimeError>;

/// Reference to a runtime value: either one of the four singleton values or
/// a slot in the object pool.
///
/// The singletons exist outside pool capacity, are never allocated or freed,
/// and the collector skips them by construction — only `Slot` references are
/// ever pushed onto the mark stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueRef {
    Nil,
    True,
    False,
    Void,
    Slot(SlotRef),
}

impl ValueRef {
    pub fn from_bool(value: bool) -> Self {
        if value { ValueRef::True } else { ValueRef::False }
    }

    /// Returns the pool slot behind this reference, if any.
    pub fn slot(self) -> Option<SlotRef> {
        match self {
            ValueRef::Slot(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn is_singleton(self) -> bool {
        !matches!(self, ValueRef::Slot(_))
    }

    pub fn is_nil(self) -> bool {
        matches!(self, ValueRef::Nil)
    }
}

/// Arithmetic and comparison operators. A closed set dispatched by the
/// evaluator rather than through function pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Eq,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 9] = [
        OperatorKind::Plus,
        OperatorKind::Minus,
        OperatorKind::Asterisk,
        OperatorKind::Slash,
        OperatorKind::Eq,
        OperatorKind::Lt,
        OperatorKind::Gt,
        OperatorKind::Lte,
        OperatorKind::Gte,
    ];

    /// The source-level spelling the operator is bound to.
    pub fn symbol(self) -> &'static str {
        match self {
            OperatorKind::Plus => "+",
            OperatorKind::Minus => "-",
            OperatorKind::Asterisk => "*",
            OperatorKind::Slash => "/",
            OperatorKind::Eq => "=",
            OperatorKind::Lt => "<",
            OperatorKind::Gt => ">",
            OperatorKind::Lte => "<=",
            OperatorKind::Gte => ">=",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Library builtins. Like operators, a closed set known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Print,
    Println,
    Str,
    Length,
    BoolP,
    Now,
    Sleep,
    TimeDiff,
    Dotimes,
}

impl BuiltinKind {
    pub const ALL: [BuiltinKind; 9] = [
        BuiltinKind::Print,
        BuiltinKind::Println,
        BuiltinKind::Str,
        BuiltinKind::Length,
        BuiltinKind::BoolP,
        BuiltinKind::Now,
        BuiltinKind::Sleep,
        BuiltinKind::TimeDiff,
        BuiltinKind::Dotimes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::Print => "print",
            BuiltinKind::Println => "println",
            BuiltinKind::Str => "str",
            BuiltinKind::Length => "length",
            BuiltinKind::BoolP => "bool?",
            BuiltinKind::Now => "now",
            BuiltinKind::Sleep => "sleep",
            BuiltinKind::TimeDiff => "time-diff",
            BuiltinKind::Dotimes => "dotimes",
        }
    }
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime value stored in an object pool slot.
///
/// `String` and `Symbol` own a byte range inside the byte heap; `Cons`,
/// `NativeFunction` and `Lambda` hold references to other values and may form
/// cyclic graphs. Freed slots are reset to `Nil`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(i32),
    String(HeapPtr),
    Symbol(HeapPtr),
    Cons {
        car: ValueRef,
        cdr: ValueRef,
    },
    NativeFunction {
        func: NativeFn,
        params: ValueRef,
        body: ValueRef,
    },
    Lambda {
        params: ValueRef,
        body: ValueRef,
    },
    Operator(OperatorKind),
    Builtin(BuiltinKind),
    Void,
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

impl Value {
    /// Canonical type label used in diagnostics and the telemetry report.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Cons { .. } => "Cons",
            Value::NativeFunction { .. } => "NativeFunction",
            Value::Lambda { .. } => "Lambda",
            Value::Operator(_) => "Operator",
            Value::Builtin(_) => "Builtin",
            Value::Void => "Void",
        }
    }

    /// The byte-heap block owned by this value, if any.
    pub fn owned_bytes(&self) -> Option<HeapPtr> {
        match self {
            Value::String(ptr) | Value::Symbol(ptr) => Some(*ptr),
            _ => None,
        }
    }

    /// Child references the collector must trace through this value.
    ///
    /// Leaf variants return no children; cons cells expose car/cdr and the
    /// callable variants expose params/body.
    pub fn children(&self) -> [Option<ValueRef>; 2] {
        match self {
            Value::Cons { car, cdr } => [Some(*car), Some(*cdr)],
            Value::NativeFunction { params, body, .. } | Value::Lambda { params, body } => {
                [Some(*params), Some(*body)]
            }
            _ => [None, None],
        }
    }
}

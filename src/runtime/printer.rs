//! Value rendering.
//!
//! Two forms: `display` is the user-facing output used by the print
//! builtins (strings raw), `repr` is the reader-facing form used by the
//! REPL and debug dumps (strings quoted). Booleans follow the classic
//! convention: `t` for true, `nil` for false.

use crate::runtime::mem::heap::ObjectHeap;
use crate::runtime::value::{Value, ValueRef};

pub fn display(heap: &ObjectHeap, value: ValueRef) -> String {
    render(heap, value, false)
}

pub fn repr(heap: &ObjectHeap, value: ValueRef) -> String {
    render(heap, value, true)
}

fn render(heap: &ObjectHeap, value: ValueRef, quoted: bool) -> String {
    match heap.value(value) {
        Value::Nil => "nil".to_string(),
        Value::Bool(true) => "t".to_string(),
        Value::Bool(false) => "nil".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(_) => {
            let text = heap.text(value).unwrap_or("");
            if quoted {
                format!("\"{text}\"")
            } else {
                text.to_string()
            }
        }
        Value::Symbol(_) => heap.text(value).unwrap_or("").to_string(),
        Value::Cons { .. } => render_list(heap, value, quoted),
        Value::NativeFunction { .. } => "#<function>".to_string(),
        Value::Lambda { .. } => "#<lambda>".to_string(),
        Value::Operator(kind) => format!("#<operator {}>", kind.symbol()),
        Value::Builtin(kind) => format!("#<builtin {}>", kind.name()),
        Value::Void => "#<void>".to_string(),
    }
}

fn render_list(heap: &ObjectHeap, value: ValueRef, quoted: bool) -> String {
    let mut out = String::from("(");
    let mut it = value;
    let mut first = true;
    loop {
        match heap.value(it) {
            Value::Cons { car, cdr } => {
                if !first {
                    out.push(' ');
                }
                out.push_str(&render(heap, car, quoted));
                it = cdr;
                first = false;
            }
            Value::Nil => break,
            // Dotted tail.
            _ => {
                out.push_str(" . ");
                out.push_str(&render(heap, it, quoted));
                break;
            }
        }
    }
    out.push(')');
    out
}

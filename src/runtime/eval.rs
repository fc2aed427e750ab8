//! The evaluator.
//!
//! Environments are association lists of `(symbol . value)` pairs living in
//! the object heap like every other value. The global environment is pinned
//! through a single retargeted root; expression trees and results are rooted
//! only around the per-source collection point in [`Evaluator::eval_source`].
//! Nothing collects in the middle of an evaluation, so intermediate values
//! need no rooting of their own.

use std::fmt;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::runtime::mem::collector::RootId;
use crate::runtime::mem::config::MemoryConfig;
use crate::runtime::mem::heap::ObjectHeap;
use crate::runtime::mem::MemError;
use crate::runtime::printer::display;
use crate::runtime::value::{BuiltinKind, OperatorKind, Value, ValueRef};
use crate::syntax::parser::{read_all, ReadError};

/// Evaluation depth cap. Exceeding it is an error rather than a stack
/// overflow.
pub const MAX_RECURSION_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    Mem(MemError),
    RecursionLimit { depth: usize },
}

impl From<MemError> for RuntimeError {
    fn from(err: MemError) -> Self {
        RuntimeError::Mem(err)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Mem(err) => write!(f, "{err}"),
            RuntimeError::RecursionLimit { depth } => {
                write!(f, "recursion limit exceeded (depth {depth})")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Anything that can go wrong between source text and a result value.
#[derive(Debug)]
pub enum EvalError {
    Read(ReadError),
    Runtime(RuntimeError),
}

impl From<ReadError> for EvalError {
    fn from(err: ReadError) -> Self {
        EvalError::Read(err)
    }
}

impl From<RuntimeError> for EvalError {
    fn from(err: RuntimeError) -> Self {
        EvalError::Runtime(err)
    }
}

impl From<MemError> for EvalError {
    fn from(err: MemError) -> Self {
        EvalError::Runtime(RuntimeError::Mem(err))
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Read(ReadError::Syntax(diag)) => f.write_str(&diag.render()),
            EvalError::Read(ReadError::Mem(err)) => write!(f, "{err}"),
            EvalError::Runtime(err) => write!(f, "{err}"),
        }
    }
}

pub struct Evaluator {
    heap: ObjectHeap,
    env: ValueRef,
    env_root: RootId,
    output: String,
}

impl Evaluator {
    /// Builds an evaluator with every operator and builtin bound in the
    /// global environment.
    pub fn new(config: MemoryConfig) -> Result<Self, MemError> {
        let mut heap = ObjectHeap::new(config);
        let env_root = heap.add_root(ValueRef::Nil)?;
        let mut this = Self {
            heap,
            env: ValueRef::Nil,
            env_root,
            output: String::new(),
        };
        for kind in OperatorKind::ALL {
            let value = this.heap.make_operator(kind)?;
            this.bind_global(kind.symbol(), value)?;
        }
        for kind in BuiltinKind::ALL {
            let value = this.heap.make_builtin(kind)?;
            this.bind_global(kind.name(), value)?;
        }
        Ok(this)
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut ObjectHeap {
        &mut self.heap
    }

    /// Text emitted by the print builtins since the last take.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Binds a name in the global environment by consing a fresh pair onto
    /// the alist and retargeting the environment root.
    pub fn bind_global(&mut self, name: &str, value: ValueRef) -> Result<(), MemError> {
        let sym = self.heap.make_symbol(name)?;
        let pair = self.heap.make_cons(sym, value)?;
        self.env = self.heap.make_cons(pair, self.env)?;
        self.heap.set_root(self.env_root, self.env);
        Ok(())
    }

    /// Reads and evaluates every expression in `source`, returning the last
    /// result. One collection runs after evaluation with the expression
    /// trees and the result rooted, so per-source garbage is reclaimed while
    /// everything still referenced survives.
    pub fn eval_source(&mut self, source: &str) -> Result<ValueRef, EvalError> {
        let exprs = read_all(&mut self.heap, source)?;

        let mut ast_roots = Vec::with_capacity(exprs.len());
        for &expr in &exprs {
            match self.heap.add_root(expr) {
                Ok(root) => ast_roots.push(root),
                Err(err) => {
                    self.unroot(&ast_roots);
                    return Err(err.into());
                }
            }
        }

        let mut result = Ok(ValueRef::Nil);
        for &expr in &exprs {
            match self.eval(expr, self.env, 0) {
                Ok(value) => result = Ok(value),
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }

        match result {
            Ok(value) => match self.heap.add_root(value) {
                Ok(result_root) => {
                    let collected = self.heap.collect();
                    self.heap.remove_root(result_root);
                    self.unroot(&ast_roots);
                    collected?;
                    Ok(value)
                }
                Err(err) => {
                    self.unroot(&ast_roots);
                    Err(err.into())
                }
            },
            Err(err) => {
                self.unroot(&ast_roots);
                Err(err.into())
            }
        }
    }

    fn unroot(&mut self, roots: &[RootId]) {
        for &root in roots {
            self.heap.remove_root(root);
        }
    }

    fn eval(&mut self, expr: ValueRef, env: ValueRef, depth: usize) -> Result<ValueRef, RuntimeError> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(RuntimeError::RecursionLimit { depth });
        }
        match self.heap.value(expr) {
            Value::Symbol(_) => {
                let name = self.heap.text(expr).unwrap_or("").to_string();
                Ok(self.lookup(env, &name).unwrap_or(ValueRef::Nil))
            }
            Value::Cons { car, cdr } => {
                if self.symbol_is(car, "dotimes") {
                    return self.eval_dotimes(cdr, env, depth);
                }
                let func = self.eval(car, env, depth + 1)?;
                let args = self.eval_args(cdr, env, depth)?;
                self.apply(func, args, env, depth)
            }
            // Everything else is self-evaluating.
            _ => Ok(expr),
        }
    }

    fn symbol_is(&self, value: ValueRef, name: &str) -> bool {
        matches!(self.heap.value(value), Value::Symbol(_)) && self.heap.text(value) == Some(name)
    }

    fn lookup(&self, env: ValueRef, name: &str) -> Option<ValueRef> {
        let mut it = env;
        while let Value::Cons { car: pair, cdr } = self.heap.value(it) {
            if let Value::Cons { car: sym, cdr: value } = self.heap.value(pair) {
                if self.symbol_is(sym, name) {
                    return Some(value);
                }
            }
            it = cdr;
        }
        None
    }

    /// Evaluates each element of an argument list into a fresh list.
    fn eval_args(&mut self, list: ValueRef, env: ValueRef, depth: usize) -> Result<ValueRef, RuntimeError> {
        let mut evaluated = Vec::new();
        let mut it = list;
        while let Value::Cons { car, cdr } = self.heap.value(it) {
            evaluated.push(self.eval(car, env, depth + 1)?);
            it = cdr;
        }
        let mut args = ValueRef::Nil;
        for value in evaluated.into_iter().rev() {
            args = self.heap.make_cons(value, args)?;
        }
        Ok(args)
    }

    fn apply(
        &mut self,
        func: ValueRef,
        args: ValueRef,
        env: ValueRef,
        depth: usize,
    ) -> Result<ValueRef, RuntimeError> {
        match self.heap.value(func) {
            Value::Operator(kind) => self.apply_operator(kind, args),
            Value::Builtin(kind) => self.apply_builtin(kind, args, env, depth),
            Value::NativeFunction { func, .. } => func(&mut self.heap, args),
            // Anything else is not callable.
            _ => Ok(ValueRef::Nil),
        }
    }

    fn list_items(&self, mut list: ValueRef) -> Vec<ValueRef> {
        let mut items = Vec::new();
        while let Value::Cons { car, cdr } = self.heap.value(list) {
            items.push(car);
            list = cdr;
        }
        items
    }

    fn number(&self, value: ValueRef) -> Option<i32> {
        match self.heap.value(value) {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Arithmetic folds over `i64` before casting back, matching wraparound
    /// behavior on overflow. A non-numeric argument yields `nil`.
    fn apply_operator(&mut self, kind: OperatorKind, args: ValueRef) -> Result<ValueRef, RuntimeError> {
        let items = self.list_items(args);
        match kind {
            OperatorKind::Plus => {
                let mut sum: i64 = 0;
                for item in &items {
                    match self.number(*item) {
                        Some(n) => sum += n as i64,
                        None => return Ok(ValueRef::Nil),
                    }
                }
                Ok(self.heap.make_number(sum as i32)?)
            }
            OperatorKind::Asterisk => {
                let mut product: i64 = 1;
                for item in &items {
                    match self.number(*item) {
                        Some(n) => product *= n as i64,
                        None => return Ok(ValueRef::Nil),
                    }
                }
                Ok(self.heap.make_number(product as i32)?)
            }
            OperatorKind::Minus => {
                let Some(first) = items.first().and_then(|v| self.number(*v)) else {
                    return Ok(ValueRef::Nil);
                };
                if items.len() == 1 {
                    return Ok(self.heap.make_number(-first)?);
                }
                let mut result = first as i64;
                for item in &items[1..] {
                    match self.number(*item) {
                        Some(n) => result -= n as i64,
                        None => return Ok(ValueRef::Nil),
                    }
                }
                Ok(self.heap.make_number(result as i32)?)
            }
            OperatorKind::Slash => {
                let Some(first) = items.first().and_then(|v| self.number(*v)) else {
                    return Ok(ValueRef::Nil);
                };
                if items.len() == 1 {
                    if first == 0 {
                        return Ok(ValueRef::Nil);
                    }
                    return Ok(self.heap.make_number(1 / first)?);
                }
                let mut result = first as i64;
                for item in &items[1..] {
                    match self.number(*item) {
                        Some(0) | None => return Ok(ValueRef::Nil),
                        Some(n) => result /= n as i64,
                    }
                }
                Ok(self.heap.make_number(result as i32)?)
            }
            OperatorKind::Eq => {
                let &[a, b] = items.as_slice() else {
                    return Ok(ValueRef::Nil);
                };
                // Same reference means same object, singletons included.
                if a == b {
                    return Ok(ValueRef::True);
                }
                match (self.number(a), self.number(b)) {
                    (Some(x), Some(y)) if x == y => Ok(ValueRef::True),
                    _ => Ok(ValueRef::Nil),
                }
            }
            OperatorKind::Lt | OperatorKind::Gt | OperatorKind::Lte | OperatorKind::Gte => {
                let &[a, b] = items.as_slice() else {
                    return Ok(ValueRef::Nil);
                };
                let (Some(x), Some(y)) = (self.number(a), self.number(b)) else {
                    return Ok(ValueRef::Nil);
                };
                let holds = match kind {
                    OperatorKind::Lt => x < y,
                    OperatorKind::Gt => x > y,
                    OperatorKind::Lte => x <= y,
                    _ => x >= y,
                };
                // Comparisons answer t or nil, never the false singleton.
                Ok(if holds { ValueRef::True } else { ValueRef::Nil })
            }
        }
    }

    fn apply_builtin(
        &mut self,
        kind: BuiltinKind,
        args: ValueRef,
        env: ValueRef,
        depth: usize,
    ) -> Result<ValueRef, RuntimeError> {
        match kind {
            BuiltinKind::Print => {
                let items = self.list_items(args);
                let rendered: Vec<String> =
                    items.iter().map(|&v| display(&self.heap, v)).collect();
                self.output.push_str(&rendered.join(" "));
                self.output.push('\n');
                Ok(ValueRef::Void)
            }
            BuiltinKind::Println => {
                for item in self.list_items(args) {
                    let text = display(&self.heap, item);
                    self.output.push_str(&text);
                    self.output.push('\n');
                }
                Ok(ValueRef::Void)
            }
            BuiltinKind::Str => {
                let mut text = String::new();
                for item in self.list_items(args) {
                    match self.heap.value(item) {
                        Value::Number(n) => text.push_str(&n.to_string()),
                        Value::String(_) | Value::Symbol(_) => {
                            text.push_str(self.heap.text(item).unwrap_or(""));
                        }
                        Value::Nil | Value::Bool(false) => text.push_str("nil"),
                        Value::Bool(true) => text.push('t'),
                        _ => text.push_str("<unknown>"),
                    }
                }
                Ok(self.heap.make_string(&text)?)
            }
            BuiltinKind::Length => {
                let Some(&target) = self.list_items(args).first() else {
                    return Ok(ValueRef::Nil);
                };
                let length = self.heap.list_length(target);
                Ok(self.heap.make_number(length as i32)?)
            }
            BuiltinKind::BoolP => {
                let Some(&target) = self.list_items(args).first() else {
                    return Ok(ValueRef::Nil);
                };
                match self.heap.value(target) {
                    Value::Bool(_) => Ok(ValueRef::True),
                    _ => Ok(ValueRef::Nil),
                }
            }
            BuiltinKind::Now => {
                let millis = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or(0);
                Ok(self.heap.make_number((millis % i32::MAX as u128) as i32)?)
            }
            BuiltinKind::Sleep => {
                if let Some(seconds) = self.list_items(args).first().and_then(|&v| self.number(v)) {
                    if seconds > 0 {
                        thread::sleep(Duration::from_secs(seconds as u64));
                    }
                    return Ok(ValueRef::Nil);
                }
                Ok(ValueRef::Nil)
            }
            BuiltinKind::TimeDiff => {
                let items = self.list_items(args);
                let (Some(&a), Some(&b)) = (items.first(), items.get(1)) else {
                    return Ok(ValueRef::Nil);
                };
                let (Some(t1), Some(t2)) = (self.number(a), self.number(b)) else {
                    return Ok(ValueRef::Nil);
                };
                Ok(self.heap.make_number(t2.wrapping_sub(t1))?)
            }
            BuiltinKind::Dotimes => self.eval_dotimes(args, env, depth),
        }
    }

    /// `(dotimes (var count) expr ...)` runs the body with `var` bound to
    /// 0 through count-1 in a fresh scope per iteration. Returns the last
    /// body result, or `nil` for a zero or malformed count.
    fn eval_dotimes(&mut self, args: ValueRef, env: ValueRef, depth: usize) -> Result<ValueRef, RuntimeError> {
        let Value::Cons { car: header, cdr: body } = self.heap.value(args) else {
            return Ok(ValueRef::Nil);
        };
        let Value::Cons { car: var, cdr: count_list } = self.heap.value(header) else {
            return Ok(ValueRef::Nil);
        };
        if !matches!(self.heap.value(var), Value::Symbol(_)) {
            return Ok(ValueRef::Nil);
        }
        let var_name = self.heap.text(var).unwrap_or("").to_string();

        let Value::Cons { car: count_expr, .. } = self.heap.value(count_list) else {
            return Ok(ValueRef::Nil);
        };
        let count_value = self.eval(count_expr, env, depth + 1)?;
        let Some(count) = self.number(count_value) else {
            return Ok(ValueRef::Nil);
        };
        if count <= 0 {
            return Ok(ValueRef::Nil);
        }

        let body_exprs = self.list_items(body);
        let mut last = ValueRef::Nil;
        for i in 0..count {
            let sym = self.heap.make_symbol(&var_name)?;
            let index = self.heap.make_number(i)?;
            let pair = self.heap.make_cons(sym, index)?;
            let scoped_env = self.heap.make_cons(pair, env)?;
            for &expr in &body_exprs {
                last = self.eval(expr, scoped_env, depth + 1)?;
            }
        }
        Ok(last)
    }
}

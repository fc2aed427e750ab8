//! Allocator facade over the slot pool, byte heap and collector.
//!
//! `ObjectHeap` is the single context object the rest of the runtime talks
//! to: constructors for every value shape, accessors that resolve
//! references, the root set API, and explicit collection. Nothing collects
//! implicitly; callers decide when to run the collector and which values to
//! pin across it.

use crate::runtime::mem::byte_heap::ByteHeap;
use crate::runtime::mem::collector::{Collector, RootId};
use crate::runtime::mem::config::MemoryConfig;
use crate::runtime::mem::slot_pool::SlotPool;
use crate::runtime::mem::telemetry::{format_mem_stats, MemStats};
use crate::runtime::mem::MemError;
use crate::runtime::value::{BuiltinKind, NativeFn, OperatorKind, Value, ValueRef};

pub struct ObjectHeap {
    pool: SlotPool,
    bytes: ByteHeap,
    gc: Collector,
    config: MemoryConfig,
}

impl ObjectHeap {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            pool: SlotPool::new(config.pool_capacity),
            bytes: ByteHeap::new(config.heap_bytes, config.chunk_size),
            gc: Collector::new(config.max_roots, config.mark_stack_capacity),
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    // -- Constructors --

    /// Booleans are singleton references; no slot is consumed.
    pub fn make_bool(&self, value: bool) -> ValueRef {
        ValueRef::from_bool(value)
    }

    pub fn make_number(&mut self, value: i32) -> Result<ValueRef, MemError> {
        self.alloc_value(Value::Number(value))
    }

    pub fn make_string(&mut self, text: &str) -> Result<ValueRef, MemError> {
        let ptr = self
            .bytes
            .allocate_bytes(text.as_bytes())
            .ok_or(MemError::HeapExhausted {
                requested: text.len() + 1,
            })?;
        match self.alloc_value(Value::String(ptr)) {
            Ok(slot) => Ok(slot),
            Err(err) => {
                // Do not leak the block when the pool is the limiting side.
                self.bytes.free(ptr);
                Err(err)
            }
        }
    }

    pub fn make_symbol(&mut self, name: &str) -> Result<ValueRef, MemError> {
        let ptr = self
            .bytes
            .allocate_bytes(name.as_bytes())
            .ok_or(MemError::HeapExhausted {
                requested: name.len() + 1,
            })?;
        match self.alloc_value(Value::Symbol(ptr)) {
            Ok(slot) => Ok(slot),
            Err(err) => {
                self.bytes.free(ptr);
                Err(err)
            }
        }
    }

    pub fn make_cons(&mut self, car: ValueRef, cdr: ValueRef) -> Result<ValueRef, MemError> {
        self.alloc_value(Value::Cons { car, cdr })
    }

    pub fn make_lambda(&mut self, params: ValueRef, body: ValueRef) -> Result<ValueRef, MemError> {
        self.alloc_value(Value::Lambda { params, body })
    }

    pub fn make_function(
        &mut self,
        func: NativeFn,
        params: ValueRef,
        body: ValueRef,
    ) -> Result<ValueRef, MemError> {
        self.alloc_value(Value::NativeFunction { func, params, body })
    }

    pub fn make_operator(&mut self, kind: OperatorKind) -> Result<ValueRef, MemError> {
        self.alloc_value(Value::Operator(kind))
    }

    pub fn make_builtin(&mut self, kind: BuiltinKind) -> Result<ValueRef, MemError> {
        self.alloc_value(Value::Builtin(kind))
    }

    fn alloc_value(&mut self, value: Value) -> Result<ValueRef, MemError> {
        self.pool
            .allocate(value)
            .map(ValueRef::Slot)
            .ok_or(MemError::PoolExhausted {
                capacity: self.pool.capacity(),
            })
    }

    // -- Accessors --

    /// Resolves a reference to its value. Singletons resolve to their fixed
    /// values; stale slot references read as `Nil`.
    pub fn value(&self, value: ValueRef) -> Value {
        match value {
            ValueRef::Nil => Value::Nil,
            ValueRef::True => Value::Bool(true),
            ValueRef::False => Value::Bool(false),
            ValueRef::Void => Value::Void,
            ValueRef::Slot(slot) => self.pool.value(slot),
        }
    }

    /// Text payload of a string or symbol. `None` for anything else.
    pub fn text(&self, value: ValueRef) -> Option<&str> {
        match self.value(value) {
            Value::String(ptr) | Value::Symbol(ptr) => Some(self.bytes.text(ptr)),
            _ => None,
        }
    }

    pub fn car(&self, value: ValueRef) -> ValueRef {
        match self.value(value) {
            Value::Cons { car, .. } => car,
            _ => ValueRef::Nil,
        }
    }

    pub fn cdr(&self, value: ValueRef) -> ValueRef {
        match self.value(value) {
            Value::Cons { cdr, .. } => cdr,
            _ => ValueRef::Nil,
        }
    }

    /// Replaces the head of a cons cell in place. `false` when `cell` does
    /// not refer to a live cons.
    pub fn set_car(&mut self, cell: ValueRef, car: ValueRef) -> bool {
        let Some(slot) = cell.slot() else {
            return false;
        };
        match self.pool.value(slot) {
            Value::Cons { cdr, .. } => self.pool.set_value(slot, Value::Cons { car, cdr }),
            _ => false,
        }
    }

    /// Replaces the tail of a cons cell in place.
    pub fn set_cdr(&mut self, cell: ValueRef, cdr: ValueRef) -> bool {
        let Some(slot) = cell.slot() else {
            return false;
        };
        match self.pool.value(slot) {
            Value::Cons { car, .. } => self.pool.set_value(slot, Value::Cons { car, cdr }),
            _ => false,
        }
    }

    /// Number of cons cells in a proper list. Improper tails end the count.
    pub fn list_length(&self, mut value: ValueRef) -> usize {
        let mut length = 0;
        while let Value::Cons { cdr, .. } = self.value(value) {
            length += 1;
            value = cdr;
        }
        length
    }

    // -- Root set --

    pub fn add_root(&mut self, value: ValueRef) -> Result<RootId, MemError> {
        self.gc.add_root(value)
    }

    pub fn remove_root(&mut self, id: RootId) -> bool {
        self.gc.remove_root(id)
    }

    pub fn set_root(&mut self, id: RootId, value: ValueRef) -> bool {
        self.gc.set_root(id, value)
    }

    pub fn root(&self, id: RootId) -> Option<ValueRef> {
        self.gc.root(id)
    }

    // -- Collection and introspection --

    /// Runs a full mark-and-sweep collection. Returns reclaimed slot count.
    pub fn collect(&mut self) -> Result<usize, MemError> {
        self.gc.collect(&mut self.pool, &mut self.bytes)
    }

    pub fn live_objects(&self) -> usize {
        self.pool.allocated_count()
    }

    pub fn free_slots(&self) -> usize {
        self.pool.free_count()
    }

    pub fn heap_free_bytes(&self) -> usize {
        self.bytes.free_bytes()
    }

    pub fn is_live(&self, value: ValueRef) -> bool {
        match value.slot() {
            Some(slot) => self.pool.is_allocated(slot),
            None => true,
        }
    }

    pub fn stats(&self) -> MemStats {
        MemStats::capture(&self.pool, &self.bytes, &self.gc)
    }

    pub fn report(&self) -> String {
        format_mem_stats(&self.stats())
    }
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

//! The operation registry — a process-wide mapping from operation name to
//! executor.
//!
//! Entries are read far more often than written (every compile looks every
//! operation name up once; registration happens rarely, outside any active
//! evaluation per the engine's concurrency model). The map is backed by
//! [`dashmap::DashMap`], which gives lock-free reads without a
//! reader/writer-lock bottleneck — the same choice the in-memory store in
//! this corpus makes for its concurrent maps.

use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

use crate::error::{EngineError, Result};

/// How many outputs an operation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputArity {
    /// The operation always produces exactly this many outputs.
    Fixed(usize),
    /// The operation reports its own output count at evaluation time (the
    /// canonical example is `split`).
    Dynamic,
}

/// Whether an operation's executor runs in-process or crosses a language
/// boundary. Both share the same input/output contract; `kind` is purely a
/// descriptive discriminator carried for introspection/tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Built-in, runs in-process without suspension.
    Native,
    /// A user-supplied callback, possibly crossing a language boundary.
    Foreign,
}

/// The error an operation executor itself can raise. Distinguishing
/// "your constants don't make sense" from "execution itself failed" lets
/// the engine surface `EngineError::InvalidArgument` vs
/// `EngineError::OperationFailure` without the executor knowing about
/// `EngineError` at all — the same boundary discipline the tool-call
/// contract in this corpus uses to keep foreign callbacks decoupled from
/// the engine's own error type.
#[derive(Debug, Clone)]
pub enum OpError {
    /// The constants passed to the operation were malformed.
    InvalidArgument(String),
    /// The operation executed but failed.
    Failure(String),
}

impl OpError {
    /// Shorthand for [`OpError::InvalidArgument`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Shorthand for [`OpError::Failure`].
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure(reason.into())
    }
}

/// The executor contract: `(inputs, constants) -> outputs`. No hidden
/// state — purity of built-ins is a testable property of this engine.
pub type OperationExecutor =
    Arc<dyn Fn(&[String], &[String]) -> std::result::Result<Vec<String>, OpError> + Send + Sync>;

/// A resolved registry entry, captured by value (via `Arc`) into every
/// `CompiledGraph` at compile time so later registry mutation never
/// affects an already-compiled graph.
pub struct OperationEntry {
    /// The operation's registered name.
    pub name: String,
    /// Declared output count (fixed or dynamic).
    pub output_arity: OutputArity,
    /// The minimum number of input ports a node using this operation must
    /// supply. Checked against the actual input count before the executor
    /// ever runs, so a node built with too few inputs fails with
    /// `EngineError::BadPort` rather than the executor indexing past the
    /// end of `inputs`.
    pub input_arity: usize,
    /// Native vs foreign discriminator.
    pub kind: OperationKind,
    /// The executor itself.
    pub executor: OperationExecutor,
}

impl OperationEntry {
    /// Run the executor, first checking `inputs.len() >= self.input_arity`
    /// (`BadPort`), then translating an [`OpError`] into the matching
    /// [`EngineError`] variant with this entry's name attached.
    pub fn invoke(&self, inputs: &[String], constants: &[String]) -> Result<Vec<String>> {
        if inputs.len() < self.input_arity {
            return Err(EngineError::bad_port(
                &self.name,
                format!("operation '{}' requires at least {} input(s), got {}", self.name, self.input_arity, inputs.len()),
            ));
        }
        (self.executor)(inputs, constants).map_err(|e| match e {
            OpError::InvalidArgument(reason) => EngineError::invalid_argument(&self.name, reason),
            OpError::Failure(reason) => EngineError::operation_failure(&self.name, reason),
        })
    }
}

impl std::fmt::Debug for OperationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationEntry")
            .field("name", &self.name)
            .field("output_arity", &self.output_arity)
            .field("input_arity", &self.input_arity)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// A process-wide (or, for tests, freestanding) table of operations.
pub struct OperationRegistry {
    entries: DashMap<String, Arc<OperationEntry>>,
}

impl OperationRegistry {
    /// An empty registry with no built-ins — mainly useful for tests that
    /// want a clean slate.
    pub fn empty() -> Self {
        Self { entries: DashMap::new() }
    }

    /// A registry pre-seeded with the engine's built-in operations (§4.1):
    /// `identity`, `reverse`, `to_upper`, `to_lower`, `concat`, `split`,
    /// `trim`, `replace`, `substring`, `repeat`, `pad_left`, `pad_right`,
    /// `capitalize`, `title`.
    pub fn new() -> Self {
        let registry = Self::empty();
        crate::builtins::register_all(&registry);
        registry
    }

    /// Insert or replace an entry. `input_arity` is the minimum number of
    /// input ports a node using this operation must supply (checked at
    /// invocation time, before the executor runs). Fails with
    /// [`EngineError::DuplicateOperation`] when `replace` is `false` and
    /// `name` already exists.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &self,
        name: impl Into<String>,
        executor: OperationExecutor,
        output_arity: OutputArity,
        input_arity: usize,
        kind: OperationKind,
        replace: bool,
    ) -> Result<()> {
        let name = name.into();
        if !replace && self.entries.contains_key(&name) {
            return Err(EngineError::DuplicateOperation(name));
        }
        let entry =
            Arc::new(OperationEntry { name: name.clone(), output_arity, input_arity, kind, executor });
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Look up an entry by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<OperationEntry>> {
        self.entries.get(name).map(|e| e.clone())
    }

    /// Whether `name` is registered.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All currently registered operation names, in no particular order.
    pub fn list(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();

/// The process-wide registry, lazily initialised with built-ins on first
/// use. `Graph::compile` resolves operation names against this registry
/// unless a graph was built against an explicit [`OperationRegistry`].
pub fn default_registry() -> &'static OperationRegistry {
    DEFAULT_REGISTRY.get_or_init(OperationRegistry::new)
}

/// Register a native or foreign operation in the process-wide registry.
/// See [`OperationRegistry::register`].
#[allow(clippy::too_many_arguments)]
pub fn register_operation(
    name: impl Into<String>,
    executor: OperationExecutor,
    output_arity: OutputArity,
    input_arity: usize,
    kind: OperationKind,
    replace: bool,
) -> Result<()> {
    default_registry().register(name, executor, output_arity, input_arity, kind, replace)
}

/// Whether `name` is registered in the process-wide registry.
pub fn has_operation(name: &str) -> bool {
    default_registry().has(name)
}

/// All operation names currently registered process-wide.
pub fn list_operations() -> Vec<String> {
    default_registry().list()
}

//! Kinds: type identities carrying an operation vocabulary, plus the
//! extension protocol for deriving enlarged vocabularies.
//!
//! A kind's registry maps operation names to resolvers. Derivation
//! snapshot-copies the parent registry, so a derived kind keeps reaching
//! everything the parent had at derivation time while later changes to the
//! parent stay invisible to it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::chain::Chain;
use crate::dispatch::{dispatch, Reply, Target};
use crate::errors::ChainError;
use crate::record::CallRecord;

/// Consumer-supplied operation body. Receives the bound chain instance and
/// the captured arguments; `Some(value)` ends the chain with that value,
/// `None` hands the chain back so the caller keeps chaining.
pub type CustomFn = dyn Fn(&Chain, &[Value]) -> Option<Value> + Send + Sync;

#[derive(Clone)]
pub(crate) enum Operation {
    /// Record the call on the chain's stack.
    Fluent,
    /// Run a consumer function bound to the chain instance.
    Custom(Arc<CustomFn>),
}

struct KindInner {
    name: String,
    ops: RwLock<BTreeMap<String, Operation>>,
}

/// Identity of an operation vocabulary. Every chain carries the kind it was
/// built from; the kind never changes for an existing chain.
///
/// `Kind::clone()` is a handle to the same identity — two handles compare
/// equal exactly when they point at the same registry.
#[derive(Clone)]
pub struct Kind {
    inner: Arc<KindInner>,
}

impl Kind {
    /// Fresh base kind with an empty vocabulary.
    pub fn root(name: impl Into<String>) -> Kind {
        Kind {
            inner: Arc::new(KindInner {
                name: name.into(),
                ops: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Derived kind with each listed name installed as a recording
    /// operation. Shorthand for [`Kind::derive`] without custom operations.
    pub fn extend(&self, methods: &[&str]) -> Kind {
        let mut derivation = self.derive();
        for method in methods {
            derivation = derivation.op(method);
        }
        derivation.seal()
    }

    /// Start a derivation that can also carry custom operations.
    pub fn derive(&self) -> Derivation {
        Derivation {
            parent: self.clone(),
            name: None,
            ops: Vec::new(),
            custom: Vec::new(),
        }
    }

    /// Install one recording operation in place on this kind. Existing
    /// chains of the kind see it immediately; an existing registration under
    /// the same name is silently overridden.
    pub fn attach(&self, method: &str) {
        self.write_op(method, Operation::Fluent);
    }

    /// Install one custom operation in place on this kind.
    pub fn attach_with<F>(&self, method: &str, f: F)
    where
        F: Fn(&Chain, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        self.write_op(method, Operation::Custom(Arc::new(f)));
    }

    fn write_op(&self, method: &str, op: Operation) {
        self.inner
            .ops
            .write()
            .expect("kind registry lock")
            .insert(method.to_string(), op);
    }

    /// Empty chain of this kind: empty stack, empty attributes, branch mode.
    pub fn construct(&self) -> Chain {
        Chain::from_parts(self.clone(), Vec::new(), BTreeMap::new(), false)
    }

    /// Chain of this kind seeded with an existing stack.
    pub fn from_stack(&self, stack: Vec<CallRecord>) -> Chain {
        Chain::from_parts(self.clone(), stack, BTreeMap::new(), false)
    }

    /// Wrap another chain: deep copy of its stack and attributes under this
    /// kind, independently owned from the moment of the call.
    pub fn wrap(&self, source: &Chain) -> Chain {
        Chain::from_parts(self.clone(), source.stack(), source.attributes(), false)
    }

    /// Empty chain of this kind already in mutate mode.
    pub fn chain(&self) -> Chain {
        let chain = self.construct();
        chain.chain();
        chain
    }

    /// Bare-kind entry point: equivalent to constructing a default instance
    /// first and invoking the operation on it.
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Reply, ChainError> {
        dispatch(Target::Bare(self), method, args)
    }

    pub fn knows(&self, method: &str) -> bool {
        self.inner
            .ops
            .read()
            .expect("kind registry lock")
            .contains_key(method)
    }

    /// Registered operation names, sorted.
    pub fn operations(&self) -> Vec<String> {
        self.inner
            .ops
            .read()
            .expect("kind registry lock")
            .keys()
            .cloned()
            .collect()
    }

    /// Look up an operation, cloning the resolver out so no registry lock is
    /// held while the operation runs.
    pub(crate) fn resolve(&self, method: &str) -> Option<Operation> {
        self.inner
            .ops
            .read()
            .expect("kind registry lock")
            .get(method)
            .cloned()
    }

    /// Bare-kind path of the combinator: fresh chain holding one record.
    pub(crate) fn seed(&self, record: CallRecord) -> Chain {
        Chain::from_parts(self.clone(), vec![record], BTreeMap::new(), false)
    }

    fn registry_snapshot(&self) -> BTreeMap<String, Operation> {
        self.inner
            .ops
            .read()
            .expect("kind registry lock")
            .clone()
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Kind {}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kind")
            .field("name", &self.inner.name)
            .field("operations", &self.operations())
            .finish()
    }
}

/// Builder for a derived kind: listed operations become recording
/// operations, custom entries carry consumer functions.
pub struct Derivation {
    parent: Kind,
    name: Option<String>,
    ops: Vec<String>,
    custom: Vec<(String, Arc<CustomFn>)>,
}

impl Derivation {
    /// Name the derived kind; defaults to the parent's name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn op(mut self, method: &str) -> Self {
        self.ops.push(method.to_string());
        self
    }

    pub fn ops<'a>(mut self, methods: impl IntoIterator<Item = &'a str>) -> Self {
        self.ops.extend(methods.into_iter().map(str::to_string));
        self
    }

    pub fn custom<F>(mut self, method: &str, f: F) -> Self
    where
        F: Fn(&Chain, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        self.custom.push((method.to_string(), Arc::new(f)));
        self
    }

    /// Produce the derived kind. The parent's registry is copied at this
    /// point; new names override inherited ones silently.
    pub fn seal(self) -> Kind {
        let mut ops = self.parent.registry_snapshot();
        for method in self.ops {
            ops.insert(method, Operation::Fluent);
        }
        for (method, f) in self.custom {
            ops.insert(method, Operation::Custom(f));
        }
        Kind {
            inner: Arc::new(KindInner {
                name: self.name.unwrap_or_else(|| self.parent.inner.name.clone()),
                ops: RwLock::new(ops),
            }),
        }
    }
}

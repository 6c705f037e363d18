//! Chain core: the recorded stack, its attribute map, and the mutate/branch
//! mode flag. Attribute propagation for every derivation lives here too.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::{dispatch, Reply, Target};
use crate::errors::ChainError;
use crate::kind::Kind;
use crate::record::CallRecord;

pub(crate) struct ChainCore {
    stack: Vec<CallRecord>,
    attributes: BTreeMap<String, Value>,
    chaining: bool,
}

/// Handle to one recorded chain.
///
/// `Chain::clone()` is an *alias*: both handles point at the same logical
/// chain, so a mutate-mode call through either is visible through both. For
/// an independent copy use [`Chain::clone_chain`].
#[derive(Clone)]
pub struct Chain {
    kind: Kind,
    core: Arc<Mutex<ChainCore>>,
}

impl Chain {
    pub(crate) fn from_parts(
        kind: Kind,
        stack: Vec<CallRecord>,
        attributes: BTreeMap<String, Value>,
        chaining: bool,
    ) -> Self {
        Self {
            kind,
            core: Arc::new(Mutex::new(ChainCore {
                stack,
                attributes,
                chaining,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChainCore> {
        self.core.lock().expect("chain core lock")
    }

    /// Switch to mutate mode: subsequent operation calls append to this
    /// chain's stack and return this same chain.
    pub fn chain(&self) -> &Self {
        self.lock().chaining = true;
        self
    }

    /// Switch to branch mode: subsequent operation calls leave this chain
    /// untouched and return a new chain extended by one record.
    pub fn unchain(&self) -> &Self {
        self.lock().chaining = false;
        self
    }

    /// Independent deep copy of the current stack and attributes, in branch
    /// mode. Never shares storage with the original.
    pub fn clone_chain(&self) -> Chain {
        let core = self.lock();
        Chain::from_parts(
            self.kind.clone(),
            core.stack.clone(),
            core.attributes.clone(),
            false,
        )
    }

    /// Store consumer metadata on this chain. Keys and values are accepted
    /// unchecked; attributes propagate to every chain derived from this one.
    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.lock().attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.lock().attributes.get(key).cloned()
    }

    pub fn attributes(&self) -> BTreeMap<String, Value> {
        self.lock().attributes.clone()
    }

    /// The recorded call sequence, in call order. This is the consumer
    /// contract: interpretation of the records happens entirely outside this
    /// crate.
    pub fn stack(&self) -> Vec<CallRecord> {
        self.lock().stack.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().stack.is_empty()
    }

    pub fn is_chaining(&self) -> bool {
        self.lock().chaining
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Invoke a registered operation by name. Fluent operations record a
    /// [`CallRecord`] and yield a chain per the current mode; custom
    /// operations may end the chain with a value instead.
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Reply, ChainError> {
        dispatch(Target::Instance(self), method, args)
    }

    /// Point-in-time serializable view of this chain.
    pub fn snapshot(&self) -> ChainSnapshot {
        let core = self.lock();
        ChainSnapshot {
            kind: self.kind.name().to_string(),
            stack: core.stack.clone(),
            attributes: core.attributes.clone(),
        }
    }

    // ── combinator support ────────────────────────────────────────────────

    /// Mutate-mode path: append in place.
    pub(crate) fn append(&self, record: CallRecord) {
        self.lock().stack.push(record);
    }

    /// Branch path: new chain of the same kind with the record appended and
    /// the attribute map carried over.
    pub(crate) fn branched(&self, record: CallRecord) -> Chain {
        let core = self.lock();
        let mut stack = core.stack.clone();
        stack.push(record);
        Chain::from_parts(self.kind.clone(), stack, core.attributes.clone(), false)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.lock();
        f.debug_struct("Chain")
            .field("kind", &self.kind.name())
            .field("len", &core.stack.len())
            .field("chaining", &core.chaining)
            .finish()
    }
}

/// Serializable mirror of a chain at one moment, in the shape consumers
/// persist or transport. Deriving a chain back from a snapshot goes through
/// [`Kind::from_stack`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub kind: String,
    pub stack: Vec<CallRecord>,
    pub attributes: BTreeMap<String, Value>,
}

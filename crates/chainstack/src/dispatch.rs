//! The combinator: the single place that decides whether an operation call
//! aliases the receiving chain or produces a copy. Every registered
//! operation, on every kind, funnels through [`dispatch`].

use serde_json::Value;

use crate::chain::Chain;
use crate::errors::ChainError;
use crate::kind::{Kind, Operation};
use crate::record::CallRecord;

/// Outcome of one operation call.
///
/// Recording operations always yield [`Reply::Chain`]; a custom operation
/// that returns a value ends the chain with [`Reply::Value`].
#[derive(Debug, Clone)]
pub enum Reply {
    Chain(Chain),
    Value(Value),
}

impl Reply {
    /// Continue the fluent sequence. Fails with [`ChainError::BrokenChain`]
    /// if a previous operation already ended the chain with a value.
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Reply, ChainError> {
        match self {
            Reply::Chain(chain) => chain.call(method, args),
            Reply::Value(_) => Err(ChainError::BrokenChain {
                method: method.to_string(),
            }),
        }
    }

    pub fn into_chain(self) -> Option<Chain> {
        match self {
            Reply::Chain(chain) => Some(chain),
            Reply::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Reply::Chain(_) => None,
            Reply::Value(value) => Some(value),
        }
    }
}

impl From<Chain> for Reply {
    fn from(chain: Chain) -> Self {
        Reply::Chain(chain)
    }
}

/// What an operation was called on: an existing chain, or the bare kind.
pub(crate) enum Target<'a> {
    Instance(&'a Chain),
    Bare(&'a Kind),
}

impl Target<'_> {
    fn kind(&self) -> &Kind {
        match self {
            Target::Instance(chain) => chain.kind(),
            Target::Bare(kind) => kind,
        }
    }
}

pub(crate) fn dispatch(
    target: Target<'_>,
    method: &str,
    args: Vec<Value>,
) -> Result<Reply, ChainError> {
    let op = target
        .kind()
        .resolve(method)
        .ok_or_else(|| ChainError::UnknownOperation {
            kind: target.kind().name().to_string(),
            method: method.to_string(),
        })?;
    match op {
        Operation::Fluent => Ok(Reply::Chain(combine(
            target,
            CallRecord::new(method, args),
        ))),
        Operation::Custom(f) => {
            let receiver = match target {
                Target::Instance(chain) => chain.clone(),
                Target::Bare(kind) => kind.construct(),
            };
            // No registry or core lock is held here; the consumer function
            // may call back into the receiver freely.
            match f(&receiver, &args) {
                Some(value) => Ok(Reply::Value(value)),
                None => Ok(Reply::Chain(receiver)),
            }
        }
    }
}

/// The decision table: instance × mode → alias or copy; bare kind → seed.
fn combine(target: Target<'_>, record: CallRecord) -> Chain {
    match target {
        Target::Instance(chain) if chain.is_chaining() => {
            chain.append(record);
            chain.clone()
        }
        Target::Instance(chain) => chain.branched(record),
        Target::Bare(kind) => kind.seed(record),
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::ChainError;
    use crate::kind::Kind;
    use serde_json::json;

    #[test]
    fn mutate_mode_appends_and_aliases() {
        let kind = Kind::root("t").extend(&["op"]);
        let c = kind.chain();
        let reply = c.call("op", crate::args![1]).expect("op registered");
        let back = reply.into_chain().expect("fluent op yields chain");
        // Same logical chain came back: appending through it is visible on c.
        back.call("op", crate::args![2]).expect("op registered");
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn branch_mode_copies_and_preserves_original() {
        let kind = Kind::root("t").extend(&["op"]);
        let c = kind.construct();
        let branched = c
            .call("op", crate::args![1])
            .expect("op registered")
            .into_chain()
            .expect("fluent op yields chain");
        assert_eq!(c.len(), 0);
        assert_eq!(branched.len(), 1);
        assert_eq!(branched.stack()[0].args, vec![json!(1)]);
    }

    #[test]
    fn bare_kind_call_seeds_a_fresh_chain() {
        let kind = Kind::root("t").extend(&["op"]);
        let seeded = kind
            .call("op", crate::args!["x"])
            .expect("op registered")
            .into_chain()
            .expect("fluent op yields chain");
        assert_eq!(seeded.len(), 1);
        assert_eq!(seeded.stack()[0].method, "op");
    }

    #[test]
    fn unknown_operation_is_surfaced_unwrapped() {
        let kind = Kind::root("t");
        let err = kind
            .construct()
            .call("missing", crate::args![])
            .expect_err("no such op");
        match err {
            ChainError::UnknownOperation { kind, method } => {
                assert_eq!(kind, "t");
                assert_eq!(method, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn continuing_past_a_terminal_value_is_an_error() {
        let kind = Kind::root("t").extend(&["op"]);
        kind.attach_with("total", |chain, _args| Some(json!(chain.len())));
        let reply = kind.chain().call("total", crate::args![]).expect("custom op");
        let err = reply.call("op", crate::args![]).expect_err("chain was ended");
        assert!(matches!(err, ChainError::BrokenChain { .. }));
    }
}

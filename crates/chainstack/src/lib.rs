//! Fluent call-recording chains.
//!
//! A [`Kind`] defines a vocabulary of named operations. Calling an operation
//! on a chain of that kind does not execute anything: it records a
//! [`CallRecord`] on the chain's stack. The consumer later reads the stack
//! and interprets or replays it however it chooses — this crate assigns no
//! meaning to any operation name or argument.
//!
//! Chains have two evaluation modes. In *mutate* mode ([`Chain::chain`])
//! every call appends to the same chain and hands it back. In *branch* mode
//! ([`Chain::unchain`], the default) every call leaves the original chain
//! untouched and returns a new chain extended by one record, so a single
//! prefix can fan out into independent variants.
//!
//! ```
//! use chainstack::{args, Kind};
//!
//! let query = Kind::root("query").extend(&["select", "from", "limit"]);
//! let q = query.chain();
//! q.call("select", args!["*"])?
//!     .call("from", args!["users"])?
//!     .call("limit", args![10])?;
//! assert_eq!(q.stack().len(), 3);
//! assert_eq!(q.stack()[1].method, "from");
//! # Ok::<(), chainstack::ChainError>(())
//! ```

pub mod chain;
pub mod dispatch;
pub mod errors;
pub mod kind;
pub mod record;

pub use chain::{Chain, ChainSnapshot};
pub use dispatch::Reply;
pub use errors::ChainError;
pub use kind::{Derivation, Kind};
pub use record::CallRecord;
pub use serde_json::Value;

#[doc(hidden)]
pub use serde_json as __json;

//! The unit of recording: one operation name plus its positional arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded invocation. Arguments are captured verbatim and in order as
/// opaque [`Value`]s; nothing is validated or interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub method: String,
    pub args: Vec<Value>,
}

impl CallRecord {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Build a `Vec<Value>` argument list using [`serde_json::json!`] syntax.
/// The whole argument list is handed to `json!` as one array, so JSON
/// literals (`{…}`, `null`) work alongside ordinary Rust expressions.
///
/// ```
/// use chainstack::args;
/// let a = args![1, "x", {"id": 7}, null];
/// assert_eq!(a.len(), 4);
/// let none = args![];
/// assert!(none.is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:tt)+) => {
        match $crate::__json::json!([$($arg)+]) {
            $crate::Value::Array(values) => values,
            _ => ::std::unreachable!(),
        }
    };
}

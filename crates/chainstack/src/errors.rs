use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("no operation `{method}` registered for kind `{kind}`")]
    UnknownOperation { kind: String, method: String },
    #[error("cannot call `{method}`: a previous operation ended the chain with a value")]
    BrokenChain { method: String },
}

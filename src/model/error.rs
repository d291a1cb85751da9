/// Errors raised when constructing model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("instrument id cannot be empty")]
    EmptyInstrumentId,
}

/// Errors raised while interpreting shared domain values.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown locale: {0}")]
    UnknownLocale(String),
}

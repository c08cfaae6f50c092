#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config Error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Registry Error: {0} is already registered")]
    DuplicateLayer(String),
    #[error("Registry Error: {0} is not registered")]
    UnknownLayer(String),
    #[error("Quantizer Error: {0} is not a known quantizer")]
    UnknownQuantizer(String),
}

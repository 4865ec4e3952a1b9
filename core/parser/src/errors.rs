use thiserror::Error;
use zena_ast::Location;

#[derive(Debug, Error)]
#[error("{location}: {message}")]
pub struct LexError {
    pub location: Location,
    pub message: String,
}

#[derive(Debug, Error)]
#[error("{location}: {message}")]
pub struct ParseError {
    pub location: Location,
    pub message: String,
}

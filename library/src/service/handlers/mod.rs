pub mod token_handler;

pub use token_handler::{EditKind, EditOperation, TokenField, TokenHandler};

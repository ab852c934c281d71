pub mod boundary;
pub mod error;
pub mod names;
pub mod resolver;

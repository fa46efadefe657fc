pub mod base_reader;
pub mod json_reader;

pub use base_reader::BatchSource;
pub use json_reader::JsonFileSource;

pub mod dead_letter;
pub mod enrichment;
pub mod extractor;
pub mod readers;
pub mod validator;
pub mod writers;

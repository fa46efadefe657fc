pub mod base_writer;
pub mod parquet_writer;

pub use base_writer::PartitionStore;
pub use parquet_writer::ParquetPartitionWriter;

/// Comma-separated encoding and decoding of registers.
pub mod csv;
mod register_file;

pub use csv::{decode, encode, DecodeError};
pub use register_file::{export, export_file_name, read_rows, LoadError, RegisterFile};

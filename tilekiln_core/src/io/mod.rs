//! Binary I/O primitives shared by the serial feature format, the string pool
//! and the MVT wire encoder: varint/zigzag integers and PBF-style
//! (field, wire-type) keys layered over either an in-memory slice or a file.
//!
//! # Examples
//!
//! ```
//! use tilekiln_core::io::{ValueReader, ValueWriter, ValueReaderSlice, ValueWriterBlob};
//!
//! let mut writer = ValueWriterBlob::new();
//! writer.write_varint(300).unwrap();
//! writer.write_svarint(-5).unwrap();
//!
//! let blob = writer.into_blob();
//! let mut reader = ValueReaderSlice::new(blob.as_slice());
//! assert_eq!(reader.read_varint().unwrap(), 300);
//! assert_eq!(reader.read_svarint().unwrap(), -5);
//! ```

mod reader;
mod writer;

pub use reader::{ValueReader, ValueReaderSlice};
pub use writer::{ValueWriter, ValueWriterBlob};

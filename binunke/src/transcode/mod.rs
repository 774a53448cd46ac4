//! Transcoding between the dictionary form of a document and other formats.
//!
//! Every codec works on the `serde_json::Value` produced by
//! `libunke::document_to_value`, so an object always travels as a map with
//! `name`, `properties` and `children` entries.

pub mod cbor;
pub mod toml;
pub mod yaml;

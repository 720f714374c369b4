//! This crate contains primitives shared across the StrataDB operator crates:
//! content fingerprinting for change detection and the conversion between
//! opaque JSON payloads and the structured protobuf values exchanged with the
//! cloud backend.

pub mod fingerprint;
pub mod payload;

pub use fingerprint::Fingerprint;

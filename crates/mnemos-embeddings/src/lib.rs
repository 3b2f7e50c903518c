//! # mnemos-embeddings
//!
//! `Embedder` implementation over an external HTTP embedding endpoint,
//! plus a deterministic test double.

mod http_embedder;
mod static_embedder;

pub use http_embedder::HttpEmbedder;
pub use static_embedder::StaticEmbedder;

//! Row (de)serialization helpers shared by the adapters, plus per-table
//! CRUD grouped the way the schema is grouped.

pub mod goal_ops;
pub mod link_ops;
pub mod memory_crud;
pub mod principle_ops;

/// Packs an `f32` embedding into a little-endian byte blob for `BLOB` storage.
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Unpacks a little-endian byte blob back into an `f32` embedding.
pub fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

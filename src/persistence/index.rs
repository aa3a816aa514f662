use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Position of a record within a chunked family: which chunk file, and
/// where inside that chunk's array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPosition {
    pub chunk_number: u32,
    pub index_in_chunk: usize,
}

/// Position of an event within its partition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPosition {
    pub partition: String,
    pub index_in_partition: usize,
}

pub type ChunkIndex = HashMap<String, ChunkPosition>;
pub type EventIndexMap = HashMap<String, PartitionPosition>;

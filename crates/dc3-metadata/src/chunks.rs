//! `number_of_chunks` / `chunk_weight` (§4.7), wrapping the Chunk Planner
//! (C2)'s shape selection with the per-axis chunk counts and byte weight.

use dc3_chunking::{chunk_counts, plan_chunk_shape, ChunkPlanError, ChunkShape, CubeDims};
use dc3_common::ChunkingStrategy;

const F64_BYTES: usize = std::mem::size_of::<f64>();

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkReport {
    pub shape: ChunkShape,
    pub number_of_chunks: usize,
    pub chunk_weight_bytes: usize,
}

pub fn chunk_report(strategy: ChunkingStrategy, dims: CubeDims) -> Result<ChunkReport, ChunkPlanError> {
    let shape = plan_chunk_shape(strategy, dims)?;
    let (cx, cy, ct) = chunk_counts(shape, dims);
    Ok(ChunkReport {
        shape,
        number_of_chunks: cx * cy * ct,
        chunk_weight_bytes: shape.x * shape.y * shape.t * F64_BYTES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_report_spinach_single_chunk() {
        let dims = CubeDims { x: 512, y: 512, t: 1 };
        let report = chunk_report(ChunkingStrategy::Spinach, dims).unwrap();
        assert_eq!(report.number_of_chunks, 1);
        assert_eq!(report.chunk_weight_bytes, 512 * 512 * 1 * F64_BYTES);
    }
}

//! Chunk Planner (C2): picks a chunk shape for the cube store from one of
//! three templates, shrinking chunk depth as the time dimension grows so
//! chunk byte size stays roughly constant.

use dc3_common::ChunkingStrategy;
use thiserror::Error;

/// Chunk shape along (x, y, t), in elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkShape {
    pub x: usize,
    pub y: usize,
    pub t: usize,
}

/// The cube's actual dimensions, used to clamp the chosen chunk shape.
#[derive(Debug, Clone, Copy)]
pub struct CubeDims {
    pub x: usize,
    pub y: usize,
    pub t: usize,
}

#[derive(Debug, Error)]
pub enum ChunkPlanError {
    #[error("unknown chunking strategy")]
    UnknownStrategy,
}

const POTATO: ChunkShape = ChunkShape {
    x: 256,
    y: 256,
    t: 32,
};
const CARROT: ChunkShape = ChunkShape {
    x: 32,
    y: 32,
    t: 1024,
};
const SPINACH: ChunkShape = ChunkShape {
    x: 1024,
    y: 1024,
    t: 1,
};

/// Double x/y and quarter t while `dims.t <= template.t / 4`, keeping
/// approximate chunk byte size constant as the time dimension shrinks, then
/// clamp every axis to the cube's actual dimension.
fn resize_time_depth(template: ChunkShape, dims: CubeDims) -> ChunkShape {
    let mut shape = template;
    while dims.t <= shape.t / 4 && shape.t > 1 {
        shape.x *= 2;
        shape.y *= 2;
        shape.t /= 4;
    }
    ChunkShape {
        x: shape.x.min(dims.x.max(1)),
        y: shape.y.min(dims.y.max(1)),
        t: shape.t.min(dims.t.max(1)),
    }
}

/// Resolve a chunking strategy tag and the cube's dimensions into a concrete
/// chunk shape.
pub fn plan_chunk_shape(
    strategy: ChunkingStrategy,
    dims: CubeDims,
) -> Result<ChunkShape, ChunkPlanError> {
    let shape = match strategy {
        ChunkingStrategy::Potato => resize_time_depth(POTATO, dims),
        ChunkingStrategy::Carrot => resize_time_depth(CARROT, dims),
        ChunkingStrategy::Spinach => ChunkShape {
            x: SPINACH.x.min(dims.x.max(1)),
            y: SPINACH.y.min(dims.y.max(1)),
            t: SPINACH.t.min(dims.t.max(1)),
        },
    };
    Ok(shape)
}

/// Number of chunks along each axis, product gives `dc3:number_of_chunks`.
pub fn chunk_counts(shape: ChunkShape, dims: CubeDims) -> (usize, usize, usize) {
    let count = |dim: usize, chunk: usize| -> usize {
        if chunk == 0 {
            0
        } else {
            (dim + chunk - 1) / chunk
        }
    };
    (
        count(dims.x, shape.x),
        count(dims.y, shape.y),
        count(dims.t, shape.t),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_potato_small_time_dim() {
        let dims = CubeDims {
            x: 4096,
            y: 4096,
            t: 4,
        };
        let shape = plan_chunk_shape(ChunkingStrategy::Potato, dims).unwrap();
        // t=4 <= 32/4=8, double once -> x:512,y:512,t:8; 4<=8/4=2? no stop.
        // resize loop: start t=32, dims.t=4 <= 8 -> double: x512,y512,t8
        // check again: 4 <= 8/4=2 -> false, stop.
        assert_eq!(shape.t, 8.min(dims.t));
    }

    #[test]
    fn test_spinach_is_fixed() {
        let dims = CubeDims {
            x: 10000,
            y: 10000,
            t: 1,
        };
        let shape = plan_chunk_shape(ChunkingStrategy::Spinach, dims).unwrap();
        assert_eq!(shape.x, 1024);
        assert_eq!(shape.y, 1024);
        assert_eq!(shape.t, 1);
    }

    #[test]
    fn test_clamped_to_small_cube() {
        let dims = CubeDims {
            x: 50,
            y: 50,
            t: 1,
        };
        let shape = plan_chunk_shape(ChunkingStrategy::Carrot, dims).unwrap();
        assert_eq!(shape.x, 50);
        assert_eq!(shape.y, 50);
    }

    #[test]
    fn test_chunk_counts() {
        let dims = CubeDims {
            x: 100,
            y: 100,
            t: 10,
        };
        let shape = ChunkShape {
            x: 40,
            y: 40,
            t: 4,
        };
        assert_eq!(chunk_counts(shape, dims), (3, 3, 3));
    }
}

//! Errors surfaced by frame rendering.

use thiserror::Error;

use crate::mesh::IndexError;

#[derive(Debug, Error)]
pub enum RenderError {
    /// A triangle indexes past the end of one of its mesh's streams.
    /// The frame is abandoned: nothing is swapped or presented.
    #[error("mesh {mesh}, triangle {triangle}: {source}")]
    MalformedMesh {
        mesh: usize,
        triangle: usize,
        #[source]
        source: IndexError,
    },

    /// The presentation surface rejected the frame.
    #[error("failed to present frame: {0}")]
    Present(String),
}

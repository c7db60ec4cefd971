// A triangle is three corners; each corner indexes the mesh's parallel
// attribute streams separately, so positions and uvs need not be shared.

/// Indices of one triangle corner into a mesh's position, color and uv streams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Index {
    pub vertex: usize,
    pub color: usize,
    pub uv: usize,
}

impl Index {
    pub const fn new(vertex: usize, color: usize, uv: usize) -> Self {
        Self { vertex, color, uv }
    }

    /// All three streams share the same index.
    pub const fn shared(index: usize) -> Self {
        Self::new(index, index, index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    pub a: Index,
    pub b: Index,
    pub c: Index,
}

impl Triangle {
    pub const fn new(a: Index, b: Index, c: Index) -> Self {
        Self { a, b, c }
    }

    /// Triangle whose corners use one index for every stream.
    pub const fn from_shared(a: usize, b: usize, c: usize) -> Self {
        Self::new(Index::shared(a), Index::shared(b), Index::shared(c))
    }

    pub fn corners(&self) -> [Index; 3] {
        [self.a, self.b, self.c]
    }
}

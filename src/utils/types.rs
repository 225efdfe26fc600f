// Type aliases for data values.
pub type Vertex3 = [f64; 3];
pub type Triangle3 = [Vertex3; 3];
pub type Tetrahedron3 = [Vertex3; 4];

// Type aliases for data indices.
// This is to know, when a function accepts or returns a usize, what it is for.
pub type VertexIdx = usize;
pub type TetIdx = usize;

#![no_main]

use libfuzzer_sys::fuzz_target;
use tetvoro::{BoundingBox, Tetrahedralization};

fuzz_target!(|data: (f64, Vec<[f64; 3]>, [f64; 3])| {
    let (scale, vertices, vertex) = data;

    let Ok(mut tetrahedralization) = Tetrahedralization::new(scale) else {
        return;
    };

    let _ = tetrahedralization.insert_vertices(&vertices);
    let _ = tetrahedralization.insert_vertex(vertex);
    let _ = tetrahedralization.is_delaunay();

    if let Ok(bbox) = BoundingBox::cube(scale) {
        let _ = tetrahedralization.voronoi_edges(&bbox);
    }

    drop(tetrahedralization);
});

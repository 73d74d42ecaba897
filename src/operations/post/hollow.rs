use tracing::debug;

use crate::graph::GraphSnapshot;
use crate::mesh::MeshBuffer;

/// Turns a solid skin into a shell of the given relative thickness.
///
/// Every vertex gets an inner twin pulled toward its node center by
/// `thickness` of its ray, every face a reversed inner twin. The open end
/// rings (whose caps were left out) are joined to their twins with a quad
/// band.
pub struct Hollow<'a> {
    graph: &'a GraphSnapshot,
    thickness: f64,
    end_cuts: &'a [Vec<usize>],
}

impl<'a> Hollow<'a> {
    /// Creates a new `Hollow` operation.
    ///
    /// Each end cut must wind the way its cap face would.
    #[must_use]
    pub fn new(graph: &'a GraphSnapshot, thickness: f64, end_cuts: &'a [Vec<usize>]) -> Self {
        Self {
            graph,
            thickness,
            end_cuts,
        }
    }

    /// Executes the operation in place.
    pub fn execute(&self, buffer: &mut MeshBuffer) {
        let count = buffer.vertex_count();
        for vertex in 0..count {
            let source = buffer.sources[vertex];
            let position = buffer.positions[vertex];
            let ray = position - self.graph.position(source);
            buffer.positions.push(position - ray * self.thickness);
            buffer.sources.push(source);
            buffer.infos.push(buffer.infos[vertex]);
        }

        let inner: Vec<Vec<usize>> = buffer
            .faces
            .iter()
            .map(|face| face.iter().rev().map(|&v| v + count).collect())
            .collect();
        buffer.faces.extend(inner);

        for cut in self.end_cuts {
            for (i, &current) in cut.iter().enumerate() {
                let next = cut[(i + 1) % cut.len()];
                buffer
                    .faces
                    .push(vec![current, next, next + count, current + count]);
            }
        }
        debug!(
            thickness = self.thickness,
            bands = self.end_cuts.len(),
            "hollowed skin"
        );
    }
}

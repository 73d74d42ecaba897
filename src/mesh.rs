use crate::graph::NodeId;
use crate::math::{Point3, Vector3};
use crate::operations::query::{Aabb, BoundingBox, IsManifold};

/// Per-vertex metadata recorded when a ring is emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexInfo {
    /// Normal of the ring the vertex was generated on.
    pub cut_direction: Vector3,
    /// Position of the vertex within its ring.
    pub order_in_cut: usize,
    /// Number of vertices in that ring.
    pub cut_size: usize,
}

/// Polygon skin produced by a build.
///
/// Faces are counter-clockwise seen from outside. Each vertex carries the
/// skeleton node it was generated from.
#[derive(Debug, Clone, Default)]
pub struct SkinMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Faces as vertex index lists (triangles, quads and end-cap polygons).
    pub faces: Vec<Vec<usize>>,
    /// Source skeleton node of every vertex.
    pub source_nodes: Vec<NodeId>,
    /// Ring metadata of every vertex.
    pub vertex_info: Vec<VertexInfo>,
}

impl SkinMesh {
    /// Returns `true` if every half-edge has exactly one reciprocal.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        IsManifold::new(&self.faces).execute()
    }

    /// Axis-aligned bounds of the vertices, or `None` for an empty mesh.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        BoundingBox::new(&self.vertices).execute()
    }
}

/// Build-local vertex and face storage, indexed by dense node indices.
#[derive(Debug, Clone, Default)]
pub struct MeshBuffer {
    /// Vertex positions.
    pub positions: Vec<Point3>,
    /// Dense source node index of every vertex.
    pub sources: Vec<usize>,
    /// Ring metadata of every vertex.
    pub infos: Vec<VertexInfo>,
    /// Generated faces.
    pub faces: Vec<Vec<usize>>,
}

impl MeshBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Appends a ring of points generated at `source` and returns their indices.
    pub fn push_ring(&mut self, points: &[Point3], source: usize, cut_direction: Vector3) -> Vec<usize> {
        let start = self.positions.len();
        for (order, point) in points.iter().enumerate() {
            self.positions.push(*point);
            self.sources.push(source);
            self.infos.push(VertexInfo {
                cut_direction,
                order_in_cut: order,
                cut_size: points.len(),
            });
        }
        (start..self.positions.len()).collect()
    }

    /// Appends a closed polygon mesh whose vertices all come from `source`.
    pub fn push_mesh(
        &mut self,
        vertices: &[Point3],
        faces: &[Vec<usize>],
        source: usize,
        cut_direction: Vector3,
    ) {
        let offset = self.positions.len();
        self.push_ring(vertices, source, cut_direction);
        self.faces.extend(
            faces
                .iter()
                .map(|face| face.iter().map(|&i| i + offset).collect::<Vec<_>>()),
        );
    }

    /// Drops every vertex at or after `len`.
    ///
    /// Faces must not reference the dropped vertices.
    pub fn truncate_vertices(&mut self, len: usize) {
        self.positions.truncate(len);
        self.sources.truncate(len);
        self.infos.truncate(len);
    }

    /// Converts the buffer into caller-facing output using `ids` to map
    /// dense node indices back to graph IDs.
    #[must_use]
    pub fn into_mesh(self, ids: &[NodeId]) -> SkinMesh {
        SkinMesh {
            vertices: self.positions,
            faces: self.faces,
            source_nodes: self.sources.iter().map(|&s| ids[s]).collect(),
            vertex_info: self.infos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_ring_records_ring_positions() {
        let mut buffer = MeshBuffer::new();
        let ring = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
        ];
        let first = buffer.push_ring(&ring, 0, Vector3::z());
        let second = buffer.push_ring(&ring, 1, Vector3::z());
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(second, vec![3, 4, 5]);
        assert_eq!(buffer.infos[4].order_in_cut, 1);
        assert_eq!(buffer.infos[4].cut_size, 3);
        assert_eq!(buffer.sources[5], 1);

        buffer.truncate_vertices(3);
        assert_eq!(buffer.vertex_count(), 3);
        assert_eq!(buffer.sources.len(), 3);
    }

    #[test]
    fn push_mesh_offsets_faces() {
        let mut buffer = MeshBuffer::new();
        buffer.push_ring(&[Point3::origin()], 0, Vector3::y());
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        buffer.push_mesh(&vertices, &[vec![0, 1, 2]], 0, Vector3::y());
        assert_eq!(buffer.faces, vec![vec![1, 2, 3]]);
    }
}

use tracing::debug;

use crate::graph::GraphSnapshot;
use crate::math::frame::{degrees_around, try_unit};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::mesh::MeshBuffer;
use crate::operations::layout::TraverseFrames;
use crate::skin::params::DeformMap;

/// Scales the component of `ray` along `axis` by `factor`.
///
/// `ray` is the offset of `position` from its node center. The axis is
/// flipped to face the ray first, so the result does not depend on the
/// axis sign.
#[must_use]
pub fn deform_along(position: &Point3, ray: &Vector3, axis: &Vector3, factor: f64) -> Point3 {
    let axis = if ray.dot(axis) < 0.0 { -axis } else { *axis };
    let projection = axis * (ray.dot(&axis) / axis.norm_squared());
    position + (projection * factor - projection)
}

/// Reshapes the skin around each vertex's source node.
///
/// An optional displacement map pushes vertices along their ray first.
/// Thickness then scales the ray along the node's base normal, width along
/// the in-ring axis perpendicular to it; with both active the two results
/// are averaged.
pub struct Deform<'a> {
    graph: &'a GraphSnapshot,
    base_normals: &'a [Vector3],
    traverse: &'a TraverseFrames,
    thickness: f64,
    width: f64,
    map: Option<(&'a DeformMap, f64)>,
}

impl<'a> Deform<'a> {
    /// Creates a new `Deform` operation that leaves the mesh unchanged
    /// until a factor or map is set.
    #[must_use]
    pub fn new(graph: &'a GraphSnapshot, base_normals: &'a [Vector3], traverse: &'a TraverseFrames) -> Self {
        Self {
            graph,
            base_normals,
            traverse,
            thickness: 1.0,
            width: 1.0,
            map: None,
        }
    }

    #[must_use]
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Sets the displacement image and its strength.
    #[must_use]
    pub fn with_map(mut self, map: Option<&'a DeformMap>, scale: f64) -> Self {
        self.map = map.map(|m| (m, scale));
        self
    }

    /// Returns `true` if executing would move any vertex.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.map.is_some() || is_scaling(self.thickness) || is_scaling(self.width)
    }

    /// Executes the deform in place.
    pub fn execute(&self, buffer: &mut MeshBuffer) {
        if !self.is_active() {
            return;
        }
        for ((position, &source), info) in buffer
            .positions
            .iter_mut()
            .zip(&buffer.sources)
            .zip(&buffer.infos)
        {
            let center = self.graph.position(source);
            let base_normal = self.base_normals[source];
            let mut ray = *position - center;

            if let Some((map, scale)) = self.map {
                let gray = self.sample(map, source, &ray);
                *position += ray * (scale * gray);
                ray = *position - center;
            }

            let mut sum = Vector3::zeros();
            let mut count = 0.0;
            if is_scaling(self.thickness) {
                sum += deform_along(position, &ray, &base_normal, self.thickness).coords;
                count += 1.0;
            }
            if is_scaling(self.width) {
                let width_axis = base_normal.cross(&info.cut_direction);
                if width_axis.norm() > TOLERANCE {
                    sum += deform_along(position, &ray, &width_axis, self.width).coords;
                    count += 1.0;
                }
            }
            if count > 0.0 {
                *position = Point3::from(sum / count);
            }
        }
        debug!(
            thickness = self.thickness,
            width = self.width,
            mapped = self.map.is_some(),
            vertices = buffer.positions.len(),
            "deformed skin"
        );
    }

    /// Gray value for a vertex: columns follow traverse rank, rows follow
    /// the angle of the ray around the traverse direction.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn sample(&self, map: &DeformMap, source: usize, ray: &Vector3) -> f64 {
        let Some(direction) = try_unit(ray) else {
            return 0.0;
        };
        let x = self.traverse.ranks[source] * map.width() / self.graph.node_count().max(1);
        let degrees = degrees_around(
            &self.base_normals[source],
            &direction,
            &self.traverse.directions[source],
        );
        let y = (degrees * map.height() as f64 / 360.0) as usize;
        map.gray(x, y.min(map.height() - 1))
    }
}

fn is_scaling(factor: f64) -> bool {
    (factor - 1.0).abs() > TOLERANCE
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::{quad_template, NodeData, SkeletonGraph};
    use approx::assert_relative_eq;

    fn single_node() -> (GraphSnapshot, TraverseFrames) {
        let mut graph = SkeletonGraph::new();
        graph
            .add_node(NodeData::new(Point3::origin(), 1.0, quad_template()))
            .unwrap();
        let frames = TraverseFrames {
            directions: vec![Vector3::x()],
            ranks: vec![0],
        };
        (graph.snapshot(), frames)
    }

    fn ring_buffer() -> MeshBuffer {
        let mut buffer = MeshBuffer::new();
        let ring = [
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(0.0, -1.0, 1.0),
            Point3::new(0.0, -1.0, -1.0),
            Point3::new(0.0, 1.0, -1.0),
        ];
        buffer.push_ring(&ring, 0, Vector3::x());
        buffer
    }

    #[test]
    fn deform_along_ignores_axis_sign() {
        let position = Point3::new(1.0, 2.0, 0.0);
        let ray = position.coords;
        let up = deform_along(&position, &ray, &Vector3::y(), 2.0);
        let down = deform_along(&position, &ray, &-Vector3::y(), 2.0);
        assert_relative_eq!(up, Point3::new(1.0, 4.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(up, down, epsilon = 1e-12);
    }

    #[test]
    fn thickness_scales_along_base_normal_only() {
        let (graph, frames) = single_node();
        let normals = [Vector3::z()];
        let mut buffer = ring_buffer();
        Deform::new(&graph, &normals, &frames)
            .with_thickness(0.5)
            .execute(&mut buffer);
        assert_relative_eq!(buffer.positions[0], Point3::new(0.0, 1.0, 0.5), epsilon = 1e-12);
        assert_relative_eq!(buffer.positions[2], Point3::new(0.0, -1.0, -0.5), epsilon = 1e-12);
    }

    #[test]
    fn thickness_and_width_are_averaged() {
        let (graph, frames) = single_node();
        let normals = [Vector3::z()];
        let mut buffer = ring_buffer();
        Deform::new(&graph, &normals, &frames)
            .with_thickness(2.0)
            .with_width(2.0)
            .execute(&mut buffer);
        // Each pass doubles one axis; the average moves both halfway.
        assert_relative_eq!(buffer.positions[0], Point3::new(0.0, 1.5, 1.5), epsilon = 1e-12);
    }

    #[test]
    fn neutral_settings_leave_mesh_untouched() {
        let (graph, frames) = single_node();
        let normals = [Vector3::z()];
        let mut buffer = ring_buffer();
        let before = buffer.positions.clone();
        let deform = Deform::new(&graph, &normals, &frames);
        assert!(!deform.is_active());
        deform.execute(&mut buffer);
        assert_eq!(buffer.positions, before);
    }

    #[test]
    fn white_map_pushes_vertices_outward() {
        let (graph, frames) = single_node();
        let normals = [Vector3::z()];
        let map = DeformMap::new(1, 1, vec![254]).unwrap();
        let mut buffer = ring_buffer();
        Deform::new(&graph, &normals, &frames)
            .with_map(Some(&map), 0.5)
            .execute(&mut buffer);
        assert_relative_eq!(buffer.positions[1], Point3::new(0.0, -1.5, 1.5), epsilon = 1e-12);
    }
}

use std::collections::HashMap;

use tracing::debug;

use crate::error::{BuildError, Result};
use crate::mesh::MeshBuffer;

/// Longest weld chain followed before the map is considered broken.
pub const MAX_WELD_HOPS: usize = 500;

/// Merges welded vertices and compacts the buffer.
///
/// Faces are remapped through the weld map, repeated indices within a face
/// are dropped, and faces left with fewer than three indices disappear.
/// Surviving vertices are renumbered in first-use order.
pub struct Weld<'a> {
    map: &'a HashMap<usize, usize>,
}

impl<'a> Weld<'a> {
    /// Creates a new `Weld` operation from a `from -> to` vertex map.
    #[must_use]
    pub fn new(map: &'a HashMap<usize, usize>) -> Self {
        Self { map }
    }

    /// Executes the weld, returning the new index of every old vertex
    /// (`None` for vertices no face uses any more).
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::WeldChainTooLong`] if following the map from
    /// some vertex takes more than [`MAX_WELD_HOPS`] steps.
    pub fn execute(&self, buffer: &mut MeshBuffer) -> Result<Vec<Option<usize>>> {
        let mut remap: Vec<Option<usize>> = vec![None; buffer.vertex_count()];
        let mut compacted = MeshBuffer::new();
        let mut faces = Vec::with_capacity(buffer.faces.len());
        let mut dropped = 0;

        for face in &buffer.faces {
            let mut welded: Vec<usize> = Vec::with_capacity(face.len());
            for &vertex in face {
                let target = self.resolve(vertex)?;
                let index = match remap[target] {
                    Some(index) => index,
                    None => {
                        let index = compacted.vertex_count();
                        compacted.positions.push(buffer.positions[target]);
                        compacted.sources.push(buffer.sources[target]);
                        compacted.infos.push(buffer.infos[target]);
                        remap[target] = Some(index);
                        index
                    }
                };
                if !welded.contains(&index) {
                    welded.push(index);
                }
            }
            if welded.len() < 3 {
                dropped += 1;
                continue;
            }
            faces.push(welded);
        }

        // Welded-away vertices share the index of their target.
        for vertex in 0..remap.len() {
            if remap[vertex].is_none() {
                remap[vertex] = remap[self.resolve(vertex)?];
            }
        }

        debug!(
            welded = self.map.len(),
            vertices = compacted.vertex_count(),
            dropped_faces = dropped,
            "welded vertices"
        );
        compacted.faces = faces;
        *buffer = compacted;
        Ok(remap)
    }

    fn resolve(&self, vertex: usize) -> Result<usize> {
        let mut current = vertex;
        for _ in 0..MAX_WELD_HOPS {
            match self.map.get(&current) {
                Some(&next) => current = next,
                None => return Ok(current),
            }
        }
        if self.map.contains_key(&current) {
            return Err(BuildError::WeldChainTooLong {
                vertex,
                hops: MAX_WELD_HOPS,
            }
            .into());
        }
        Ok(current)
    }
}

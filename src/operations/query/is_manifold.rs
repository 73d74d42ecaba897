use std::collections::HashMap;

/// Checks that a polygon soup is a closed, consistently oriented 2-manifold.
///
/// Every directed half-edge must appear exactly once and have exactly one
/// reciprocal half-edge in some other face.
pub struct IsManifold<'a> {
    faces: &'a [Vec<usize>],
}

impl<'a> IsManifold<'a> {
    /// Creates a new `IsManifold` query.
    #[must_use]
    pub fn new(faces: &'a [Vec<usize>]) -> Self {
        Self { faces }
    }

    /// Executes the check, returning `true` if the faces are manifold.
    #[must_use]
    pub fn execute(&self) -> bool {
        let mut half_edges: HashMap<(usize, usize), usize> = HashMap::new();
        for face in self.faces {
            if face.len() < 3 {
                return false;
            }
            for (i, &from) in face.iter().enumerate() {
                let to = face[(i + 1) % face.len()];
                if from == to {
                    return false;
                }
                *half_edges.entry((from, to)).or_insert(0) += 1;
            }
        }
        half_edges
            .iter()
            .all(|(&(from, to), &count)| count == 1 && half_edges.get(&(to, from)) == Some(&1))
    }
}

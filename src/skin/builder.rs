use std::collections::{HashMap, HashSet};

use tracing::{debug, debug_span, warn};

use crate::error::Result;
use crate::graph::{GraphSnapshot, NodeKind, SkeletonGraph};
use crate::math::frame::try_unit;
use crate::math::Vector3;
use crate::mesh::MeshBuffer;
use crate::operations::creation::MakeBox;
use crate::operations::cut::{Cut, CutFrame, CutTransform, MakeCut};
use crate::operations::junction::WrapJunction;
use crate::operations::layout::{layout_nodes, resolve_traverse_directions, TraverseFrames};
use crate::operations::normal::ResolveBaseNormals;
use crate::operations::post::{Deform, Hollow, Weld};
use crate::operations::stitch::{EdgeLoop, StitchLoops};

use super::output::{JunctionReport, NodeFrame, SkinOutput};
use super::params::SkinParams;

/// Builds a closed polygon skin around a skeleton graph.
///
/// The graph is only read. Every build works on its own snapshot, so
/// repeated builds of the same graph with the same parameters produce
/// identical meshes.
///
/// # Example
///
/// ```
/// use skinmesh::graph::{circle_template, NodeData, SkeletonGraph};
/// use skinmesh::math::Point3;
/// use skinmesh::skin::{BuildSkin, SkinParams};
///
/// let mut graph = SkeletonGraph::new();
/// let a = graph.add_node(NodeData::new(Point3::origin(), 0.5, circle_template(8)))?;
/// let b = graph.add_node(NodeData::new(Point3::new(0.0, 2.0, 0.0), 0.5, circle_template(8)))?;
/// graph.add_edge(a, b)?;
///
/// let output = BuildSkin::new(SkinParams::default()).execute(&graph)?;
/// assert!(output.succeeded);
/// assert_eq!(output.mesh.vertices.len(), 16);
/// assert!(output.mesh.is_manifold());
/// # Ok::<(), skinmesh::SkinError>(())
/// ```
pub struct BuildSkin {
    params: SkinParams,
}

/// Build-local state shared by the ring generation steps.
struct Rings {
    buffer: MeshBuffer,
    edge_cuts: Vec<Vec<EdgeLoop>>,
    end_cuts: Vec<Vec<usize>>,
    weld_map: HashMap<usize, usize>,
    swallowed_edges: HashSet<usize>,
    swallowed_nodes: HashSet<usize>,
    transforms: Vec<Option<CutTransform>>,
    junctions: Vec<JunctionReport>,
    succeeded: bool,
}

impl BuildSkin {
    /// Creates a new `BuildSkin` operation.
    #[must_use]
    pub fn new(params: SkinParams) -> Self {
        Self { params }
    }

    /// Executes the build.
    ///
    /// Junctions that cannot be wrapped are not errors: they leave holes in
    /// the mesh and clear [`SkinOutput::succeeded`].
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or the weld map is
    /// corrupt.
    pub fn execute(&self, graph: &SkeletonGraph) -> Result<SkinOutput> {
        self.params.validate()?;
        let mut snapshot = graph.snapshot();
        let span = debug_span!(
            "build_skin",
            nodes = snapshot.node_count(),
            edges = snapshot.edges.len()
        );
        let _guard = span.enter();

        let count = snapshot.node_count();
        if count == 0 {
            debug!("empty skeleton");
            return Ok(SkinOutput::empty());
        }

        // Step 1: order nodes and resolve their frames.
        let order = layout_nodes(&snapshot);
        let traverse = resolve_traverse_directions(&snapshot, &order);
        let mut base_normals = ResolveBaseNormals::new(&traverse, &order)
            .with_axes(self.params.base_normal_axes)
            .with_average(self.params.average_base_normals)
            .execute(&snapshot);

        // Step 2: emit rings, caps and junction wraps. Junctions go first so
        // that a swallowed neighbor has not produced a ring of its own yet.
        let mut rings = Rings {
            buffer: MeshBuffer::new(),
            edge_cuts: vec![Vec::new(); snapshot.edges.len()],
            end_cuts: Vec::new(),
            weld_map: HashMap::new(),
            swallowed_edges: HashSet::new(),
            swallowed_nodes: HashSet::new(),
            transforms: vec![None; count],
            junctions: Vec::new(),
            succeeded: true,
        };
        let (junctions, others): (Vec<usize>, Vec<usize>) = order
            .iter()
            .copied()
            .partition(|&node| snapshot.kind(node) == NodeKind::Junction);
        for node in junctions.into_iter().chain(others) {
            if rings.swallowed_nodes.contains(&node) {
                continue;
            }
            match snapshot.kind(node) {
                NodeKind::Isolated => emit_box(&snapshot, node, &traverse, &mut rings),
                NodeKind::Endpoint => {
                    self.emit_endpoint(&snapshot, node, &traverse, &mut base_normals, &mut rings);
                }
                NodeKind::PassThrough => {
                    emit_pass_through(&snapshot, node, &traverse, &mut base_normals, &mut rings);
                }
                NodeKind::Junction => {
                    self.emit_junction(&mut snapshot, node, &traverse, &base_normals, &mut rings);
                }
            }
        }
        debug!(
            vertices = rings.buffer.vertex_count(),
            faces = rings.buffer.faces.len(),
            swallowed = rings.swallowed_nodes.len(),
            "generated rings"
        );

        // Step 3: close every tube segment that received both of its rings.
        let mut stitched = 0;
        for (edge, cuts) in rings.edge_cuts.iter().enumerate() {
            if cuts.len() != 2 {
                continue;
            }
            let result = StitchLoops::new(cuts).execute(&rings.buffer.positions);
            if !result.finished() {
                warn!(edge, failed = ?result.failed_loops, "tube segment left open");
                rings.succeeded = false;
            }
            rings.buffer.faces.extend(result.faces);
            stitched += 1;
        }
        debug!(stitched, "stitched tube segments");

        // Step 4: post-process.
        let mut buffer = rings.buffer;
        let mut end_cuts = rings.end_cuts;
        if !rings.weld_map.is_empty() {
            let remap = Weld::new(&rings.weld_map).execute(&mut buffer)?;
            for cut in &mut end_cuts {
                *cut = cut.iter().filter_map(|&v| remap[v]).collect();
            }
        }
        Deform::new(&snapshot, &base_normals, &traverse)
            .with_thickness(self.params.deform_thickness)
            .with_width(self.params.deform_width)
            .with_map(self.params.deform_map.as_ref(), self.params.deform_map_scale)
            .execute(&mut buffer);
        if self.params.hollow_thickness > 0.0 {
            Hollow::new(&snapshot, self.params.hollow_thickness, &end_cuts).execute(&mut buffer);
        }

        let frames = (0..count)
            .map(|node| NodeFrame {
                node: snapshot.ids[node],
                kind: snapshot.kind(node),
                traverse_direction: traverse.directions[node],
                base_normal: base_normals[node],
                traverse_rank: traverse.ranks[node],
                cut_transform: rings.transforms[node],
            })
            .collect();
        debug!(
            succeeded = rings.succeeded,
            vertices = buffer.vertex_count(),
            faces = buffer.faces.len(),
            "build finished"
        );
        Ok(SkinOutput {
            mesh: buffer.into_mesh(&snapshot.ids),
            succeeded: rings.succeeded,
            junctions: rings.junctions,
            frames,
        })
    }

    fn emit_endpoint(
        &self,
        graph: &GraphSnapshot,
        node: usize,
        traverse: &TraverseFrames,
        base_normals: &mut [Vector3],
        rings: &mut Rings,
    ) {
        let edge = graph.incident[node][0];
        let ray = ray_toward(graph, node, graph.other_end(edge, node), traverse);
        let cut = make_ring(graph, node, ray, base_normals[node], traverse);
        let ring = rings.buffer.push_ring(&cut.points, node, ray);
        base_normals[node] = cut.base_normal;
        rings.transforms[node] = Some(cut.transform);

        // The ring winds away from its edge, so it doubles as the cap.
        if self.params.hollow_thickness > 0.0 {
            rings.end_cuts.push(ring.clone());
        } else {
            rings.buffer.faces.push(ring.clone());
        }
        rings.edge_cuts[edge].push(EdgeLoop::new(ring, -ray));
    }

    fn emit_junction(
        &self,
        graph: &mut GraphSnapshot,
        node: usize,
        traverse: &TraverseFrames,
        base_normals: &[Vector3],
        rings: &mut Rings,
    ) {
        let outcome = WrapJunction::new(graph, node, base_normals[node], &traverse.directions)
            .with_swallowed_edges(&rings.swallowed_edges)
            .with_step_back(self.params.wrap_step_back_factor)
            .with_weld_factor(self.params.wrap_weld_factor)
            .execute(&mut rings.buffer);
        rings.junctions.push(JunctionReport {
            node: graph.ids[node],
            attempts: outcome.attempts,
            swallowed: outcome.swallows.iter().map(|s| graph.ids[s.node]).collect(),
            succeeded: outcome.succeeded,
        });
        if !outcome.succeeded {
            warn!(node, attempts = outcome.attempts, "junction could not be wrapped");
            rings.succeeded = false;
            return;
        }

        rings.buffer.faces.extend(outcome.faces);
        for (edge, edge_loop) in outcome.edge_cuts {
            rings.edge_cuts[edge].push(edge_loop);
        }
        for (from, to) in outcome.welds {
            rings.weld_map.entry(from).or_insert(to);
        }
        for swallow in &outcome.swallows {
            rings.swallowed_edges.insert(swallow.edge);
            rings.swallowed_nodes.insert(swallow.node);
            graph.redirect_edge(swallow.replacement, swallow.node, node);
            graph.incident[node][swallow.slot] = swallow.replacement;
        }
    }
}

fn emit_box(graph: &GraphSnapshot, node: usize, traverse: &TraverseFrames, rings: &mut Rings) {
    let data = &graph.nodes[node];
    let (vertices, faces) =
        MakeBox::for_template(data.position, data.radius, data.cut_template.len()).execute();
    rings
        .buffer
        .push_mesh(&vertices, &faces, node, traverse.directions[node]);
}

fn emit_pass_through(
    graph: &GraphSnapshot,
    node: usize,
    traverse: &TraverseFrames,
    base_normals: &mut [Vector3],
    rings: &mut Rings,
) {
    let [first, second] = [graph.incident[node][0], graph.incident[node][1]];
    let to_first = ray_toward(graph, node, graph.other_end(first, node), traverse);
    let to_second = ray_toward(graph, node, graph.other_end(second, node), traverse);
    let cut_normal = try_unit(&(to_first - to_second)).unwrap_or(traverse.directions[node]);

    let cut = make_ring(graph, node, cut_normal, base_normals[node], traverse);
    let ring = rings.buffer.push_ring(&cut.points, node, cut_normal);
    base_normals[node] = cut.base_normal;
    rings.transforms[node] = Some(cut.transform);

    let toward_first = EdgeLoop::new(ring, -cut_normal);
    rings.edge_cuts[second].push(toward_first.reversed());
    rings.edge_cuts[first].push(toward_first);
}

/// Unit direction from `node` to `neighbor`, falling back to the node's
/// traverse direction when the two coincide.
fn ray_toward(graph: &GraphSnapshot, node: usize, neighbor: usize, traverse: &TraverseFrames) -> Vector3 {
    try_unit(&(graph.position(neighbor) - graph.position(node))).unwrap_or(traverse.directions[node])
}

fn make_ring(
    graph: &GraphSnapshot,
    node: usize,
    cut_normal: Vector3,
    base_normal: Vector3,
    traverse: &TraverseFrames,
) -> Cut {
    let data = &graph.nodes[node];
    let frame = CutFrame {
        base_normal,
        cut_normal,
        traverse_direction: traverse.directions[node],
    };
    MakeCut::new(data.position, data.radius, &data.cut_template, frame)
        .with_rotation(data.cut_rotation)
        .execute()
}

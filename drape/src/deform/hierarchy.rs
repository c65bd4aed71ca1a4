use super::mesh::Mesh;
use crate::math::*;
use std::sync::Arc;

/// Local-to-world placement of a mesh.
///
/// `matrix` maps points; `rotation` is kept separately because displacements are
/// free vectors and only their orientation is brought back into local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub matrix: Mat34,
    pub rotation: Quat,
}

impl Transform {
    pub fn identity() -> Self {
        Self { matrix: Mat34::identity(), rotation: Quat::identity() }
    }

    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let rotation = rotation.normalized();
        Self { matrix: Mat34::from_trs(translation, rotation, scale), rotation }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self { matrix: Mat34::translate(translation), rotation: Quat::identity() }
    }

    /// `self` as parent, `child` as local: the child's world transform.
    pub fn then(&self, child: &Transform) -> Transform {
        Transform { matrix: self.matrix * child.matrix, rotation: self.rotation * child.rotation }
    }

    pub fn point_to_world(&self, p: Vec3) -> Vec3 {
        &self.matrix * p
    }

    /// Rotates a world-space direction into local space. Scale and translation are not applied.
    pub fn direction_to_local(&self, d: Vec3) -> Vec3 {
        self.rotation.inverse() * d
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Stable identity of a hierarchy node. Registry key across repeated bakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Renderable slot on a node. `mesh` is whatever geometry is currently assigned.
#[derive(Debug, Clone, Default)]
pub struct MeshRenderer {
    pub mesh: Option<Arc<Mesh>>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub local: Transform,
    pub renderer: Option<MeshRenderer>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id: NodeId(id), name: name.into(), local: Transform::identity(), renderer: None, children: Vec::new() }
    }

    pub fn with_transform(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    pub fn with_mesh(mut self, mesh: Arc<Mesh>) -> Self {
        self.renderer = Some(MeshRenderer { mesh: Some(mesh) });
        self
    }

    pub fn with_renderer(mut self, renderer: MeshRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first walk over every node carrying a renderer, with its world transform.
    pub fn visit_renderers<F>(&self, f: &mut F)
    where
        F: FnMut(&Node, &MeshRenderer, &Transform),
    {
        self.visit_renderers_from(&Transform::identity(), f);
    }

    fn visit_renderers_from<F>(&self, parent: &Transform, f: &mut F)
    where
        F: FnMut(&Node, &MeshRenderer, &Transform),
    {
        let world = parent.then(&self.local);
        if let Some(renderer) = &self.renderer {
            f(self, renderer, &world);
        }
        for child in &self.children {
            child.visit_renderers_from(&world, f);
        }
    }

    pub fn for_each_node_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Node),
    {
        f(self);
        for child in &mut self.children {
            child.for_each_node_mut(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_direction_ignores_translation_and_scale() {
        let rot = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let t = Transform::from_trs(Vec3::new(5.0, 5.0, 5.0), rot, Vec3::new(3.0, 3.0, 3.0));
        // world +y is local +x for a +90deg turn around z
        assert_vec_close(t.direction_to_local(Vec3::new(0.0, 1.0, 0.0)), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_parent_child_composition() {
        let parent = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let child = Transform::from_trs(
            Vec3::new(0.0, 2.0, 0.0),
            Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2),
            Vec3::new(1.0, 1.0, 1.0),
        );
        let world = parent.then(&child);
        assert_vec_close(world.point_to_world(Vec3::new(1.0, 0.0, 0.0)), Vec3::new(1.0, 3.0, 0.0));
    }

    #[test]
    fn test_visit_renderers_depth_first() {
        let mesh = Arc::new(Mesh::default());
        let root = Node::new(1, "root")
            .with_transform(Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)))
            .with_child(
                Node::new(2, "body")
                    .with_mesh(mesh.clone())
                    .with_transform(Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)))
                    .with_child(Node::new(3, "button").with_mesh(mesh.clone())),
            )
            .with_child(Node::new(4, "empty"))
            .with_child(Node::new(5, "sleeve").with_renderer(MeshRenderer::default()));

        let mut seen = Vec::new();
        root.visit_renderers(&mut |node, _, world| seen.push((node.id, world.point_to_world(Vec3::ZERO))));
        assert_eq!(seen.iter().map(|(id, _)| id.0).collect::<Vec<_>>(), vec![2, 3, 5]);
        assert_vec_close(seen[1].1, Vec3::new(1.0, 1.0, 0.0));
    }
}

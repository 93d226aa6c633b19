//! Scene graph and hierarchical scene organization.
//!
//! Every node stores `(local, world)` pairs, one per instance. World transforms are
//! propagated top-down by [`SceneNode::update_world_transforms`]: a node with a single
//! parent instance places all of its own instances relative to it, otherwise the
//! parent's instances are matched to the node's instances by index.

use log::warn;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::{Instance, InstanceRaw},
        model,
    },
    render::{Instanced, Render},
};

/// Which pipeline a [`ModelNode`] is drawn with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shading {
    #[default]
    Lit,
    Unlit,
    Lines,
}

pub trait SceneNode {
    fn get_world_transforms(&self) -> Vec<Instance>;

    fn get_local_transform(&self, idx: usize) -> Option<Instance>;

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn set_local_transform(&mut self, idx: usize, instance: Instance);

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(&mut Instance));

    /// Uploads the world transforms of this node and all children.
    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device);

    fn update_world_transforms(&mut self, parents_world_transform: &[Instance]);

    /// Treats this node as a root: world transforms equal the local ones.
    fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&[Instance::default()]);
    }

    fn instance_count(&self) -> usize;

    /// Appends an instance. Returns the new instance count.
    fn add_instance(&mut self, instance: Instance) -> usize;

    fn add_instances(&mut self, instances: Vec<Instance>) -> usize;

    fn remove_instance(&mut self, idx: usize) -> Option<(Instance, Instance)>;

    /**
     * Inserts a new instance which is a clone of the instance with index `i`.
     *
     * The return value is the index of the newly created instance.
     */
    fn clone_instance(&mut self, i: usize) -> Option<usize>;

    fn get_render<'pass>(&self) -> Render<'_, 'pass>;
}

fn propagate(
    instances: &mut [(Instance, Instance)],
    children: &mut [Box<dyn SceneNode>],
    parents_world_transform: &[Instance],
) {
    match parents_world_transform {
        [parent] => instances
            .iter_mut()
            .for_each(|(local, world)| *world = parent * &*local),
        parents if parents.len() == instances.len() => instances
            .iter_mut()
            .zip(parents)
            .for_each(|((local, world), parent)| *world = parent * &*local),
        parents => {
            warn!(
                "You tried to transform {} instances with {} parent transforms.",
                instances.len(),
                parents.len()
            );
            return;
        }
    }
    let world_transforms: Vec<Instance> = instances.iter().map(|(_, world)| world.clone()).collect();
    for child in children.iter_mut() {
        child.update_world_transforms(&world_transforms);
    }
}

fn paired(instances: Vec<Instance>) -> Vec<(Instance, Instance)> {
    instances
        .into_iter()
        .map(|instance| (instance.clone(), instance))
        .collect()
}

/// A node without geometry that only groups and transforms its children.
pub struct ContainerNode {
    pub children: Vec<Box<dyn SceneNode>>,
    pub instances: Vec<(Instance, Instance)>,
}

impl ContainerNode {
    pub fn new(amount: usize) -> Self {
        Self {
            instances: paired(vec![Instance::default(); amount]),
            children: vec![],
        }
    }

    pub fn with_local(local: Instance) -> Self {
        Self {
            instances: paired(vec![local]),
            children: vec![],
        }
    }
}

impl SceneNode for ContainerNode {
    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn set_local_transform(&mut self, idx: usize, instance: Instance) {
        if let Some((local, _)) = self.instances.get_mut(idx) {
            *local = instance;
        }
    }

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        self.instances
            .iter_mut()
            .for_each(|(local, _)| mutation(local));
    }

    fn get_world_transforms(&self) -> Vec<Instance> {
        self.instances
            .iter()
            .map(|(_, world)| world)
            .cloned()
            .collect()
    }

    fn update_world_transforms(&mut self, parents_world_transform: &[Instance]) {
        propagate(&mut self.instances, &mut self.children, parents_world_transform);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_local_transform(&self, idx: usize) -> Option<Instance> {
        self.instances.get(idx).map(|(local, _)| local).cloned()
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue, device));
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn add_instance(&mut self, instance: Instance) -> usize {
        self.instances.push((instance.clone(), instance));
        self.instances.len()
    }

    fn add_instances(&mut self, instances: Vec<Instance>) -> usize {
        self.instances.append(&mut paired(instances));
        self.instances.len()
    }

    fn remove_instance(&mut self, idx: usize) -> Option<(Instance, Instance)> {
        (idx < self.instances.len()).then(|| self.instances.remove(idx))
    }

    fn clone_instance(&mut self, i: usize) -> Option<usize> {
        let pair = self.instances.get(i)?.clone();
        self.instances.push(pair);
        Some(self.instances.len() - 1)
    }

    fn get_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::Composed(self.children.iter().map(|child| child.get_render()).collect())
    }
}

/// A model drawn once per instance with a shared instance buffer.
pub struct ModelNode {
    children: Vec<Box<dyn SceneNode>>,
    instance_buffer: wgpu::Buffer,
    instances: Vec<(Instance, Instance)>,
    buffer_size_needs_change: bool,
    model: model::Model,
    shading: Shading,
    id: u32,
}

impl ModelNode {
    pub fn from_model(amount: usize, id: u32, device: &wgpu::Device, model: model::Model) -> Self {
        let instances = paired(vec![Instance::default(); amount]);
        let instance_buffer = mk_instance_buffer(device, &instances);
        Self {
            children: vec![],
            instance_buffer,
            instances,
            buffer_size_needs_change: false,
            model,
            shading: Shading::default(),
            id,
        }
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    /// Replaces all instances at once, e.g. after a simulation step.
    pub fn set_instances(&mut self, instances: Vec<Instance>) {
        if instances.len() != self.instances.len() {
            self.buffer_size_needs_change = true;
        }
        self.instances = paired(instances);
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn model(&self) -> &model::Model {
        &self.model
    }
}

fn mk_instance_buffer(device: &wgpu::Device, instances: &[(Instance, Instance)]) -> wgpu::Buffer {
    let mut raw_instances: Vec<InstanceRaw> =
        instances.iter().map(|(_, world)| world.to_raw()).collect();
    // zero sized vertex buffers are invalid
    if raw_instances.is_empty() {
        raw_instances.push(Instance::default().to_raw());
    }
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Instance Buffer"),
        contents: bytemuck::cast_slice(&raw_instances),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

impl SceneNode for ModelNode {
    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn set_local_transform(&mut self, idx: usize, instance: Instance) {
        if let Some((local, _)) = self.instances.get_mut(idx) {
            *local = instance;
        }
    }

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        self.instances
            .iter_mut()
            .for_each(|(local, _)| mutation(local));
    }

    fn get_world_transforms(&self) -> Vec<Instance> {
        self.instances
            .iter()
            .map(|(_, world)| world)
            .cloned()
            .collect()
    }

    fn update_world_transforms(&mut self, parents_world_transform: &[Instance]) {
        propagate(&mut self.instances, &mut self.children, parents_world_transform);
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_local_transform(&self, idx: usize) -> Option<Instance> {
        self.instances.get(idx).map(|(local, _)| local).cloned()
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        if self.buffer_size_needs_change {
            self.instance_buffer = mk_instance_buffer(device, &self.instances);
            self.buffer_size_needs_change = false;
        } else if !self.instances.is_empty() {
            let raw_instances: Vec<InstanceRaw> = self
                .instances
                .iter()
                .map(|(_, world)| world.to_raw())
                .collect();
            queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&raw_instances),
            );
        }
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue, device));
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn add_instance(&mut self, instance: Instance) -> usize {
        self.instances.push((instance.clone(), instance));
        self.buffer_size_needs_change = true;
        self.instances.len()
    }

    fn add_instances(&mut self, instances: Vec<Instance>) -> usize {
        self.instances.append(&mut paired(instances));
        self.buffer_size_needs_change = true;
        self.instances.len()
    }

    fn remove_instance(&mut self, idx: usize) -> Option<(Instance, Instance)> {
        if idx >= self.instances.len() {
            return None;
        }
        self.buffer_size_needs_change = true;
        Some(self.instances.remove(idx))
    }

    fn clone_instance(&mut self, i: usize) -> Option<usize> {
        let pair = self.instances.get(i)?.clone();
        self.instances.push(pair);
        self.buffer_size_needs_change = true;
        Some(self.instances.len() - 1)
    }

    fn get_render<'pass>(&self) -> Render<'_, 'pass> {
        let mut renders: Vec<Render<'_, 'pass>> =
            self.children.iter().map(|child| child.get_render()).collect();
        if !self.instances.is_empty() {
            let instanced = Instanced {
                instance: &self.instance_buffer,
                model: &self.model,
                amount: self.instances.len(),
                id: self.id,
            };
            renders.push(match self.shading {
                Shading::Lit => Render::Default(instanced),
                Shading::Unlit => Render::Unlit(instanced),
                Shading::Lines => Render::Lines(instanced),
            });
        }
        Render::Composed(renders)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Quaternion, Rotation3, Vector3};

    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn world_transforms_compose_down_the_tree() {
        let mut root = ContainerNode::with_local(Instance::from(Vector3::new(10.0, 0.0, 0.0)));
        let mut arm = ContainerNode::with_local(
            Instance::from(Vector3::new(0.0, 1.0, 0.0))
                .with_rotation(Quaternion::from_angle_z(cgmath::Deg(90.0))),
        );
        arm.add_child(Box::new(ContainerNode::with_local(Instance::from(
            Vector3::new(1.0, 0.0, 0.0),
        ))));
        root.add_child(Box::new(arm));

        root.update_world_transform_all();

        let arm = &root.get_children()[0];
        assert!(close(arm.get_world_transforms()[0].position, Vector3::new(10.0, 1.0, 0.0)));
        let tip = &arm.get_children()[0];
        // +x rotated by 90° about z points along +y
        assert!(close(tip.get_world_transforms()[0].position, Vector3::new(10.0, 2.0, 0.0)));
    }

    #[test]
    fn a_single_parent_places_every_child_instance() {
        let mut group = ContainerNode::with_local(Instance::from(Vector3::new(0.0, 5.0, 0.0)));
        let mut moons = ContainerNode::new(0);
        moons.add_instances(vec![
            Instance::from(Vector3::new(3.0, 0.0, 0.0)),
            Instance::from(Vector3::new(-3.0, 0.0, 0.0)),
        ]);
        group.add_child(Box::new(moons));
        group.update_world_transform_all();

        let world = group.get_children()[0].get_world_transforms();
        assert_eq!(world.len(), 2);
        assert!(close(world[0].position, Vector3::new(3.0, 5.0, 0.0)));
        assert!(close(world[1].position, Vector3::new(-3.0, 5.0, 0.0)));
    }

    #[test]
    fn mismatched_parent_counts_leave_the_node_untouched() {
        let mut node = ContainerNode::new(3);
        node.set_local_transform(0, Instance::from(Vector3::new(1.0, 0.0, 0.0)));
        node.update_world_transforms(&[Instance::default(), Instance::default()]);
        assert_eq!(node.get_world_transforms()[0], Instance::default());
    }

    #[test]
    fn instances_can_be_added_cloned_and_removed() {
        let mut node = ContainerNode::new(1);
        assert_eq!(node.add_instance(Instance::from(Vector3::new(2.0, 0.0, 0.0))), 2);
        assert_eq!(node.clone_instance(1), Some(2));
        assert_eq!(node.clone_instance(9), None);
        let (local, _) = node.remove_instance(2).unwrap();
        assert_eq!(local.position, Vector3::new(2.0, 0.0, 0.0));
        assert!(node.remove_instance(5).is_none());
        assert_eq!(node.instance_count(), 2);
    }

    #[test]
    fn local_mutations_apply_to_every_instance() {
        let mut node = ContainerNode::new(2);
        node.set_local_transform_all(&mut |local| local.position.y += 1.0);
        node.update_world_transform_all();
        assert!(node
            .get_world_transforms()
            .iter()
            .all(|w| close(w.position, Vector3::new(0.0, 1.0, 0.0))));
    }
}

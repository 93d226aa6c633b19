//! Render composition and pipeline batching.
//!
//! Flows describe what to draw with a [`Render`] tree. The engine walks the tree each
//! frame, sorts the instanced draws into one batch per pipeline (lit, unlit, lines) and
//! runs custom closures directly. The same tree drives picking.

use std::{
    collections::{HashMap, HashSet},
    ops::Range,
};

use wgpu::RenderPass;

use crate::{
    context::Context,
    data_structures::{model::Model, scene_graph::SceneNode},
};

/// Data for instanced object rendering: a model, instance buffer, and pick ID.
///
/// Instance `i` of the buffer is reported as `id + i` when picked. An `id` of 0
/// opts out of picking because 0 is what the pick target is cleared to.
#[derive(Clone, Copy)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
    pub id: u32,
}

impl Instanced<'_> {
    /// All pick ids covered by this draw.
    pub fn ids(&self) -> Range<u32> {
        if self.id == 0 {
            return 0..0;
        }
        let amount = u32::try_from(self.amount).unwrap_or(u32::MAX);
        self.id..self.id.saturating_add(amount)
    }

    pub fn is_pickable(&self) -> bool {
        self.id != 0 && self.amount > 0
    }
}

/// Draw calls collected from all flows, one list per pipeline.
#[derive(Default)]
pub(crate) struct Batches<'a> {
    pub lit: Vec<Instanced<'a>>,
    pub unlit: Vec<Instanced<'a>>,
    pub lines: Vec<Instanced<'a>>,
}

/// Specifies how a scene object should be rendered.
///
/// - `None` renders nothing
/// - `Default(Instanced)` / `Defaults(Vec<Instanced>)` use the lit pipeline
/// - `Unlit(Instanced)` / `Unlits(Vec<Instanced>)` use the unlit pipeline (vertex colours, textures, no lighting)
/// - `Lines(Instanced)` draws every mesh as a line strip
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
/// - `Custom(...)` invokes a user-defined closure for custom rendering
///
/// Lines and custom renders are not pickable.
pub enum Render<'a, 'pass>
where
    'pass: 'a,
{
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Unlit(Instanced<'a>),
    Unlits(Vec<Instanced<'a>>),
    Lines(Instanced<'a>),
    Composed(Vec<Render<'a, 'pass>>),
    Custom(Box<dyn 'a + FnOnce(&Context, &mut wgpu::RenderPass<'pass>)>),
}

fn insert_ids(map: &mut HashMap<u32, HashSet<usize>>, instanced: &Instanced, flow_id: usize) {
    for id in instanced.ids() {
        map.entry(id).or_default().insert(flow_id);
    }
}

impl<'a, 'pass> Render<'a, 'pass> {
    /// Map object IDs to flow IDs for picking and selection.
    ///
    /// Walks the render tree and records, for every pickable instanced draw, the
    /// flow that produced it.
    pub(crate) fn map_ids(&self, flow_id: usize, map: &mut HashMap<u32, HashSet<usize>>) {
        match self {
            Render::Default(instanced) | Render::Unlit(instanced) => {
                insert_ids(map, instanced, flow_id)
            }
            Render::Defaults(vec) | Render::Unlits(vec) => vec
                .iter()
                .for_each(|instanced| insert_ids(map, instanced, flow_id)),
            Render::Composed(renders) => renders
                .iter()
                .for_each(|render| render.map_ids(flow_id, map)),
            Render::None | Render::Lines(_) | Render::Custom(_) => (),
        }
    }

    pub(crate) fn set_pipelines(
        self,
        ctx: &Context,
        render_pass: &mut RenderPass<'pass>,
        batches: &mut Batches<'a>,
    ) {
        match self {
            Render::Default(instanced) => batches.lit.push(instanced),
            Render::Defaults(mut vec) => batches.lit.append(&mut vec),
            Render::Unlit(instanced) => batches.unlit.push(instanced),
            Render::Unlits(mut vec) => batches.unlit.append(&mut vec),
            Render::Lines(instanced) => batches.lines.push(instanced),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(ctx, render_pass, batches)),
            Render::Custom(f) => f(ctx, render_pass),
            Render::None => (),
        }
    }

    /// Collects everything that can be picked into `pickables`.
    pub(crate) fn set_pick_pipelines(self, pickables: &mut Vec<Instanced<'a>>) {
        match self {
            Render::Default(instanced) | Render::Unlit(instanced) => {
                if instanced.is_pickable() {
                    pickables.push(instanced);
                }
            }
            Render::Defaults(vec) | Render::Unlits(vec) => {
                pickables.extend(vec.into_iter().filter(Instanced::is_pickable))
            }
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pick_pipelines(pickables)),
            // Picking is not supported for line strips and custom renders
            Render::None | Render::Lines(_) | Render::Custom(_) => (),
        }
    }
}

impl<'a, 'pass> From<&'a dyn SceneNode> for Render<'a, 'pass> {
    fn from(sn: &'a dyn SceneNode) -> Self {
        sn.get_render()
    }
}


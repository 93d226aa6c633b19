//! "Shoot the cubes": cubes fly towards the camera, clicking one removes it and scores
//! a point, every cube that gets past the camera costs a point.

use std::f32::consts::FRAC_PI_2;

use cgmath::{Deg, EuclideanSpace, Point3, Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;
use rand::Rng;
use winit::event::{ElementState, MouseButton, WindowEvent};

use crate::{
    camera::{Camera, Projection},
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        scene_graph::{ModelNode, SceneNode},
        texture::{Texture, checkerboard},
    },
    flow::{FlowConsturctor, GraphicsFlow, Out},
    geometry::{
        primitives::{cuboid, plane},
        ray::{Aabb, Ray},
    },
    pipelines::light::{LightUniform, SpotLight},
    render::Render,
    resources::{
        mesh::model_from_mesh,
        texture::{default_material, load_texture, material_from_textures},
    },
};

pub const CUBE_SIZE: f32 = 5.0;
pub const SPAWN_INTERVAL_MILLIS: u64 = 500;
/// Units per millisecond along +Z.
pub const SPEED: f32 = 0.02;
/// Cubes beyond this plane have escaped.
pub const ESCAPE_Z: f32 = 30.0;
pub const SPAWN_Z: f32 = -80.0;
const HIGHLIGHT: [f32; 3] = [1.0, 0.0, 0.0];
/// Pick id of the first cube. Cube `i` reports `CUBE_PICK_ID + i`.
const CUBE_PICK_ID: u32 = 1;
const GROUND_TEXTURE: &str = "checker_large.gif";

#[derive(Clone, Debug, PartialEq)]
pub struct Cube {
    pub id: u32,
    pub position: Vector3<f32>,
    pub color: [f32; 4],
}

impl Cube {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_size(
            Point3::from_vec(self.position),
            Vector3::new(CUBE_SIZE, CUBE_SIZE, CUBE_SIZE),
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct Shooter {
    cubes: Vec<Cube>,
    score: i32,
    next_id: u32,
    hovered: Option<u32>,
    /// Cube ids in instance order when the pointer went down.
    aimed: Vec<u32>,
}

impl Shooter {
    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    /// Id of the cube under the pointer.
    pub fn hovered(&self) -> Option<u32> {
        self.hovered
    }

    pub fn push(&mut self, position: Vector3<f32>, color: [f32; 4]) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.cubes.push(Cube { id, position, color });
        id
    }

    /// New cube somewhere in a 80 x 40 window far in front of the camera.
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u32 {
        let position = Vector3::new(
            rng.gen_range(-40.0..40.0),
            rng.gen_range(0.0..40.0),
            SPAWN_Z,
        );
        let color = [
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            1.0,
        ];
        self.push(position, color)
    }

    /// Moves every cube towards the camera. Escaped cubes are removed and each costs a
    /// point. Returns how many escaped.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let step = SPEED * dt.as_secs_f32() * 1000.0;
        self.cubes.iter_mut().for_each(|cube| cube.position.z += step);
        let before = self.cubes.len();
        self.cubes.retain(|cube| cube.position.z <= ESCAPE_Z);
        let escaped = before - self.cubes.len();
        self.score -= escaped as i32;
        self.forget_missing_hover();
        escaped
    }

    /// Removes the cube with `id` and scores a point.
    pub fn shoot_id(&mut self, id: u32) -> Option<Cube> {
        let index = self.cubes.iter().position(|cube| cube.id == id)?;
        let cube = self.cubes.remove(index);
        self.score += 1;
        self.forget_missing_hover();
        Some(cube)
    }

    /// Remembers which cube every instance slot holds right now. Picks report slots,
    /// and the answer can arrive after cubes have moved on or escaped.
    pub fn aim(&mut self) {
        self.aimed = self.cubes.iter().map(|cube| cube.id).collect();
    }

    /// Shoots the cube that held instance slot `index` at the last [`Shooter::aim`].
    /// Cubes gone since then are missed.
    pub fn shoot_aimed(&mut self, index: usize) -> Option<Cube> {
        let id = *self.aimed.get(index)?;
        self.shoot_id(id)
    }

    /// Highlights the nearest cube hit by `ray`. Returns whether the highlight moved.
    pub fn hover(&mut self, ray: &Ray) -> bool {
        let hit = self
            .cubes
            .iter()
            .filter_map(|cube| ray.intersect_aabb(&cube.bounds()).map(|t| (t, cube.id)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id);
        let changed = hit != self.hovered;
        self.hovered = hit;
        changed
    }

    fn forget_missing_hover(&mut self) {
        if let Some(id) = self.hovered
            && !self.cubes.iter().any(|cube| cube.id == id)
        {
            self.hovered = None;
        }
    }

    pub fn instances(&self) -> Vec<Instance> {
        self.cubes
            .iter()
            .map(|cube| {
                let emissive = if self.hovered == Some(cube.id) {
                    HIGHLIGHT
                } else {
                    [0.0; 3]
                };
                Instance::from(cube.position)
                    .with_tint(cube.color)
                    .with_emissive(emissive)
            })
            .collect()
    }
}

/// Grey directional key light and a white spot from just above it, over white ambient.
pub fn light() -> LightUniform {
    LightUniform::directional((0.0, 5.0, 100.0), (0.0, 0.0, 0.0), [0.67; 3], 0.3)
        .with_spot(SpotLight::new((0.0, 8.0, 100.0), [1.0; 3]))
}

pub struct ShooterFlow {
    game: Shooter,
    cubes: ModelNode,
    ground: ModelNode,
}

impl ShooterFlow {
    pub async fn new(ctx: &InitContext) -> Self {
        let (device, queue) = (&ctx.device, &ctx.queue);
        let cube = model_from_mesh(
            device,
            &cuboid(CUBE_SIZE, CUBE_SIZE, CUBE_SIZE),
            "cube",
            default_material(device, queue, "cube"),
        );
        let cubes = ModelNode::from_model(0, CUBE_PICK_ID, device, cube);

        let diffuse = match load_texture(GROUND_TEXTURE, false, device, queue, Some("gif")).await {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("Generating a checkerboard instead of {GROUND_TEXTURE}: {e}");
                Texture::from_rgba(device, queue, &checkerboard(512, 8), Some("checkerboard"), false)
            }
        };
        let material = material_from_textures(device, queue, "ground", diffuse, None);
        let ground = model_from_mesh(device, &plane(1000.0, 1000.0, 50, 50, 10.0), "ground", material);
        let mut ground = ModelNode::from_model(1, 0, device, ground);
        let mut floor = Instance::from(Vector3::new(0.0, -4.0, 0.0));
        floor.rotation = Quaternion::from_angle_x(Rad(-FRAC_PI_2));
        ground.set_local_transform(0, floor);
        ground.update_world_transform_all();
        ground.write_to_buffers(queue, device);

        Self {
            game: Shooter::default(),
            cubes,
            ground,
        }
    }

    fn sync(&mut self, ctx: &Context) {
        self.cubes.set_instances(self.game.instances());
        self.cubes.update_world_transform_all();
        self.cubes.write_to_buffers(&ctx.queue, &ctx.device);
    }
}

fn show_score(ctx: &Context, score: i32) {
    let text = format!("Score: {score}");
    ctx.set_title(&text);
    #[cfg(target_arch = "wasm32")]
    if let Some(element) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id("scoreText"))
    {
        element.set_inner_html(&text);
    }
}

impl GraphicsFlow<(), ()> for ShooterFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), ()> {
        ctx.tick_duration_millis = SPAWN_INTERVAL_MILLIS;
        ctx.clear_colour = wgpu::Color::BLACK;
        ctx.camera.camera = Camera::looking_to((0.0, 15.0, 125.0), Vector3::new(0.0, 0.0, -1.0));
        let (width, height) = ctx.size();
        ctx.projection = Projection::perspective(width, height, Deg(45.0), 1.0, 4000.0);
        ctx.light.uniform = light();

        self.game.spawn(&mut rand::thread_rng());
        self.sync(ctx);
        show_score(ctx, self.game.score());
        Out::Empty
    }

    fn on_click(&mut self, ctx: &Context, _: &mut (), id: u32) -> Out<(), ()> {
        let Some(index) = id.checked_sub(CUBE_PICK_ID) else {
            return Out::Empty;
        };
        if let Some(cube) = self.game.shoot_aimed(index as usize) {
            log::info!("Hit cube {} (score {})", cube.id, self.game.score());
            show_score(ctx, self.game.score());
            self.sync(ctx);
        }
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, _: &mut (), dt: Duration) -> Out<(), ()> {
        let escaped = self.game.advance(dt);
        if escaped > 0 {
            log::info!("{escaped} cube(s) escaped (score {})", self.game.score());
            show_score(ctx, self.game.score());
        }
        self.sync(ctx);
        Out::Empty
    }

    fn on_tick(&mut self, ctx: &Context, _: &mut ()) -> Out<(), ()> {
        self.game.spawn(&mut rand::thread_rng());
        self.sync(ctx);
        Out::Empty
    }

    fn on_window_events(&mut self, ctx: &Context, _: &mut (), event: &WindowEvent) -> Out<(), ()> {
        match event {
            // runs before the pick, while the instance buffer still matches the cubes
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.game.aim(),
            WindowEvent::CursorMoved { .. } => {
                if let Some(ray) = ctx.mouse_ray()
                    && self.game.hover(&ray)
                {
                    self.sync(ctx);
                }
            }
            _ => {}
        }
        Out::Empty
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::Composed(vec![self.ground.get_render(), self.cubes.get_render()])
    }
}

pub fn constructor() -> FlowConsturctor<(), ()> {
    Box::new(|ctx| {
        Box::pin(async move { Box::new(ShooterFlow::new(&ctx).await) as Box<dyn GraphicsFlow<_, _>> })
    })
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn spawned_cubes_start_in_the_spawn_window() {
        let mut game = Shooter::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            game.spawn(&mut rng);
        }
        for cube in game.cubes() {
            assert!((-40.0..40.0).contains(&cube.position.x));
            assert!((0.0..40.0).contains(&cube.position.y));
            assert_eq!(cube.position.z, SPAWN_Z);
            assert_eq!(cube.color[3], 1.0);
        }
        let ids: Vec<u32> = game.cubes().iter().map(|c| c.id).collect();
        assert_eq!(ids, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn cubes_move_at_fixed_speed() {
        let mut game = Shooter::default();
        game.push(Vector3::new(0.0, 0.0, -80.0), [1.0; 4]);
        assert_eq!(game.advance(Duration::from_millis(1000)), 0);
        assert!((game.cubes()[0].position.z - -60.0).abs() < 1e-3);
    }

    #[test]
    fn only_escaped_cubes_are_removed() {
        let mut game = Shooter::default();
        let old = game.push(Vector3::new(0.0, 0.0, -80.0), [1.0; 4]);
        let fast = game.push(Vector3::new(0.0, 0.0, 29.0), [1.0; 4]);
        let escaped = game.advance(Duration::from_millis(100));
        assert_eq!(escaped, 1);
        assert_eq!(game.score(), -1);
        let left: Vec<u32> = game.cubes().iter().map(|c| c.id).collect();
        assert_eq!(left, vec![old]);
        assert_ne!(old, fast);
    }

    #[test]
    fn shooting_scores_and_removes() {
        let mut game = Shooter::default();
        game.push(Vector3::new(0.0, 0.0, -80.0), [1.0; 4]);
        let second = game.push(Vector3::new(10.0, 0.0, -80.0), [1.0; 4]);
        assert_eq!(game.shoot_id(second).map(|c| c.id), Some(second));
        assert_eq!(game.score(), 1);
        assert_eq!(game.cubes().len(), 1);
        assert!(game.shoot_id(second).is_none());
        assert!(game.shoot_id(99).is_none());
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn a_late_pick_still_hits_the_cube_that_was_clicked() {
        let mut game = Shooter::default();
        game.push(Vector3::new(0.0, 0.0, 29.0), [1.0; 4]);
        let target = game.push(Vector3::new(10.0, 0.0, -80.0), [1.0; 4]);
        let bystander = game.push(Vector3::new(-10.0, 0.0, -80.0), [1.0; 4]);
        game.aim();
        // the front cube escapes before the pick comes back
        assert_eq!(game.advance(Duration::from_millis(100)), 1);
        assert_eq!(game.score(), -1);

        assert_eq!(game.shoot_aimed(1).map(|c| c.id), Some(target));
        assert_eq!(game.score(), 0);
        let left: Vec<u32> = game.cubes().iter().map(|c| c.id).collect();
        assert_eq!(left, vec![bystander]);
    }

    #[test]
    fn picking_a_cube_that_already_escaped_misses() {
        let mut game = Shooter::default();
        game.push(Vector3::new(0.0, 0.0, 29.0), [1.0; 4]);
        game.push(Vector3::new(10.0, 0.0, -80.0), [1.0; 4]);
        game.aim();
        game.advance(Duration::from_millis(100));
        assert!(game.shoot_aimed(0).is_none());
        assert!(game.shoot_aimed(7).is_none());
        assert_eq!(game.score(), -1);
        assert_eq!(game.cubes().len(), 1);
    }

    #[test]
    fn the_scene_is_lit_by_a_spot_above_the_key_light() {
        let light = light();
        assert!(light.is_directional());
        assert!(light.has_spot());
        assert_eq!(light.spot_position, [0.0, 8.0, 100.0]);
        assert_eq!(light.spot_color, [1.0; 3]);
        assert_eq!(light.ambient_color, [1.0; 3]);
        assert_eq!(light.ambient, 0.3);
    }

    #[test]
    fn hover_picks_the_nearest_cube_and_clears() {
        let mut game = Shooter::default();
        let far = game.push(Vector3::new(0.0, 0.0, -80.0), [1.0; 4]);
        let near = game.push(Vector3::new(0.0, 0.0, -40.0), [1.0; 4]);
        let towards = Ray::new(Point3::new(0.0, 0.0, 100.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(game.hover(&towards));
        assert_eq!(game.hovered(), Some(near));
        assert!(!game.hover(&towards));

        let instances = game.instances();
        assert_eq!(instances[0].emissive, [0.0; 3]);
        assert_eq!(instances[1].emissive, HIGHLIGHT);

        let away = Ray::new(Point3::new(0.0, 0.0, 100.0), Vector3::new(0.0, 1.0, 0.0));
        assert!(game.hover(&away));
        assert_eq!(game.hovered(), None);
        assert_ne!(far, near);
    }

    #[test]
    fn shooting_the_hovered_cube_clears_the_highlight() {
        let mut game = Shooter::default();
        game.push(Vector3::new(0.0, 0.0, -40.0), [1.0; 4]);
        game.hover(&Ray::new(Point3::new(0.0, 0.0, 100.0), Vector3::new(0.0, 0.0, -1.0)));
        assert!(game.hovered().is_some());
        game.aim();
        game.shoot_aimed(0);
        assert_eq!(game.hovered(), None);
    }
}

//! Solar system: textured planets on circular orbits around an unlit sun, with moons,
//! two ringed planets, orbit paths and an asteroid belt loaded in the background.
//!
//! All motion is derived from the elapsed time, so the animation runs at the same
//! speed regardless of the frame rate.

use std::f32::consts::PI;

use cgmath::{Deg, Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;
use rand::Rng;

use crate::{
    camera::{Camera, Projection},
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        model::Model,
        scene_graph::{ContainerNode, ModelNode, SceneNode, Shading},
    },
    flow::{FlowConsturctor, GraphicsFlow, Out},
    geometry::primitives::{circle_outline, ring, uv_sphere},
    pipelines::light::LightUniform,
    render::Render,
    resources::{
        load_model_obj,
        mesh::model_from_mesh,
        texture::{default_material, load_bump_map, load_texture_or, material_from_textures},
    },
};

/// Orbit angle per elapsed millisecond, before the planet's own speed factor.
pub const TIME_SCALE: f32 = 0.0003;
/// Spin rates in radians per second.
pub const PLANET_SPIN: f32 = 0.6;
pub const MOON_SPIN: f32 = 0.3;
pub const BELT_SPIN: f32 = 0.3;
pub const ASTEROID_SPIN: f32 = 0.3;

pub const SUN_RADIUS: f32 = 3.0;
pub const MOON_RADIUS: f32 = 0.5;
pub const MOON_DISTANCE: f32 = 3.0;
pub const RING_TILT: f32 = -0.4 * PI;
pub const ORBIT_SEGMENTS: u32 = 128;
/// Width and height segments of the sun, planet and moon spheres.
pub const SPHERE_SEGMENTS: (u32, u32) = (28, 14);

pub const ASTEROIDS: usize = 700;
pub const ASTEROID_SCALE: f32 = 0.0005;
pub const BELT_RADIUS: f32 = 32.0;
pub const BELT_WIDTH: f32 = 3.0;
const ASTEROID_MODEL: &str = "planets/10464_Asteroid_v1_Iterations-2.obj";

const BUMP_STRENGTH: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Planet {
    pub name: &'static str,
    pub radius: f32,
    pub orbit: f32,
    pub speed: f32,
    pub moons: usize,
    pub texture: &'static str,
    pub bump: Option<&'static str>,
    pub ring: Option<&'static str>,
    /// Used when the texture is missing.
    pub fallback: [u8; 4],
}

pub const PLANETS: [Planet; 9] = [
    Planet { name: "mercury", radius: 1.0, orbit: 10.0, speed: 5.0, moons: 0, texture: "mercurymap.jpg", bump: Some("mercurybump.jpg"), ring: None, fallback: [151, 151, 159, 255] },
    Planet { name: "venus", radius: 1.5, orbit: 15.0, speed: 3.0, moons: 0, texture: "venusmap.jpg", bump: Some("venusbump.jpg"), ring: None, fallback: [227, 187, 118, 255] },
    Planet { name: "earth", radius: 1.5, orbit: 20.0, speed: 2.0, moons: 1, texture: "earthmap1k.jpg", bump: Some("earthbump1k.jpg"), ring: None, fallback: [40, 110, 200, 255] },
    Planet { name: "mars", radius: 1.5, orbit: 25.0, speed: 1.5, moons: 2, texture: "marsmap1k.jpg", bump: Some("marsbump1k.jpg"), ring: None, fallback: [193, 68, 14, 255] },
    Planet { name: "jupiter", radius: 2.0, orbit: 30.0, speed: 1.0, moons: 5, texture: "jupiter2_1k.jpg", bump: None, ring: None, fallback: [216, 202, 157, 255] },
    Planet { name: "saturn", radius: 2.0, orbit: 38.0, speed: 0.8, moons: 5, texture: "saturnmap.jpg", bump: None, ring: Some("saturnringcolor.jpg"), fallback: [227, 224, 192, 255] },
    Planet { name: "uranus", radius: 2.0, orbit: 43.0, speed: 0.6, moons: 5, texture: "uranusmap.jpg", bump: None, ring: Some("uranusringcolour.jpg"), fallback: [172, 229, 238, 255] },
    Planet { name: "neptune", radius: 2.0, orbit: 48.0, speed: 0.5, moons: 5, texture: "neptunemap.jpg", bump: None, ring: None, fallback: [91, 93, 223, 255] },
    Planet { name: "pluto", radius: 1.5, orbit: 53.0, speed: 0.4, moons: 5, texture: "plutomap1k.jpg", bump: Some("plutobump1k.jpg"), ring: None, fallback: [200, 180, 160, 255] },
];

impl Planet {
    /// Position on the orbit after `elapsed`.
    pub fn position(&self, elapsed: Duration) -> Vector3<f32> {
        let tau = elapsed.as_secs_f32() * 1000.0 * TIME_SCALE * self.speed;
        Vector3::new(tau.cos() * self.orbit, 0.0, tau.sin() * self.orbit)
    }
}

fn asset(file_name: &str) -> String {
    format!("planets/{file_name}")
}

/// Moon positions relative to their planet.
pub fn moon_offsets(count: usize) -> Vec<Vector3<f32>> {
    let on_circle = |angle: f32| {
        Vector3::new(
            MOON_DISTANCE * angle.sin(),
            0.0,
            MOON_DISTANCE * angle.cos(),
        )
    };
    match count {
        0 => vec![],
        1 => vec![on_circle(1.0)],
        n => (0..n).map(|i| on_circle((n * i) as f32)).collect(),
    }
}

/// Asteroid positions scattered over a band between `BELT_RADIUS` and
/// `BELT_RADIUS + BELT_WIDTH`, lifted one unit above the orbit plane.
pub fn asteroid_positions<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Vector3<f32>> {
    (0..count)
        .map(|i| {
            let radius = BELT_RADIUS + rng.gen_range(0.0..BELT_WIDTH);
            let angle = (i * ASTEROIDS) as f32;
            Vector3::new(angle.sin() * radius, 1.0, angle.cos() * radius)
        })
        .collect()
}

/// Rotation about Y after spinning at `rate` rad/s for `elapsed`.
pub fn spin(rate: f32, elapsed: Duration) -> Quaternion<f32> {
    Quaternion::from_angle_y(Rad(rate * elapsed.as_secs_f32()))
}

pub enum SolarEvent {
    AsteroidsLoaded(anyhow::Result<Model>),
}

pub struct SolarSystemFlow {
    device: wgpu::Device,
    queue: wgpu::Queue,
    elapsed: Duration,
    sun: ModelNode,
    orbit_paths: ModelNode,
    // one node per planet: [0] the planet (ring as its child), [1] the moon group
    planets: Vec<ContainerNode>,
    belt: Option<ContainerNode>,
}

async fn textured_material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    name: &str,
    texture: &str,
    bump: Option<&str>,
    fallback: [u8; 4],
) -> crate::data_structures::model::Material {
    let diffuse = load_texture_or(&asset(texture), fallback, device, queue).await;
    let normal = match bump {
        Some(bump) => Some(load_bump_map(&asset(bump), BUMP_STRENGTH, device, queue).await),
        None => None,
    };
    material_from_textures(device, queue, name, diffuse, normal)
}

async fn mk_planet(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    planet: &Planet,
    moon: &Model,
) -> ContainerNode {
    let material = textured_material(
        device,
        queue,
        planet.name,
        planet.texture,
        planet.bump,
        planet.fallback,
    )
    .await;
    let sphere = model_from_mesh(
        device,
        &uv_sphere(planet.radius, SPHERE_SEGMENTS.0, SPHERE_SEGMENTS.1),
        planet.name,
        material,
    );
    let body = ModelNode::from_model(1, 0, device, sphere);

    let ring = match planet.ring {
        Some(ring_texture) => {
            let diffuse =
                load_texture_or(&asset(ring_texture), [200, 190, 160, 255], device, queue).await;
            let material = material_from_textures(device, queue, ring_texture, diffuse, None);
            let annulus = model_from_mesh(device, &ring(2.5, 3.0, 64), ring_texture, material);
            let mut annulus =
                ModelNode::from_model(1, 0, device, annulus).with_shading(Shading::Unlit);
            annulus.set_local_transform(0, Quaternion::from_angle_x(Rad(RING_TILT)).into());
            Some(Box::new(annulus) as Box<dyn SceneNode>)
        }
        None => None,
    };

    let moons = (planet.moons > 0).then(|| {
        let offsets = moon_offsets(planet.moons);
        let mut moons = ModelNode::from_model(offsets.len(), 0, device, moon.clone());
        for (i, offset) in offsets.into_iter().enumerate() {
            moons.set_local_transform(i, Instance::from(offset));
        }
        Box::new(moons) as Box<dyn SceneNode>
    });

    planet_system(planet, Box::new(body), moons, ring)
}

/// Hierarchy of one planet. The orbiting container holds the spinning body, which
/// carries the moon group as its first child and the ring after it, so both turn
/// with the planet.
fn planet_system(
    planet: &Planet,
    mut body: Box<dyn SceneNode>,
    moons: Option<Box<dyn SceneNode>>,
    ring: Option<Box<dyn SceneNode>>,
) -> ContainerNode {
    if let Some(moons) = moons {
        let mut group = ContainerNode::new(1);
        group.add_child(moons);
        body.add_child(Box::new(group));
    }
    if let Some(ring) = ring {
        body.add_child(ring);
    }
    let mut system = ContainerNode::with_local(Instance::from(planet.position(Duration::ZERO)));
    system.add_child(body);
    system
}

/// Local transforms of one planet system after `elapsed`. Moons orbit at the
/// planet's spin plus their group's spin.
pub fn pose_planet(system: &mut dyn SceneNode, planet: &Planet, elapsed: Duration) {
    system.set_local_transform(0, Instance::from(planet.position(elapsed)));
    let Some(body) = system.get_children_mut().get_mut(0) else {
        return;
    };
    body.set_local_transform(0, spin(PLANET_SPIN, elapsed).into());
    if planet.moons == 0 {
        return;
    }
    let moon_spin = spin(MOON_SPIN, elapsed);
    if let Some(group) = body.get_children_mut().get_mut(0) {
        group.set_local_transform(0, moon_spin.into());
        for moons in group.get_children_mut() {
            moons.set_local_transform_all(&mut |moon: &mut Instance| moon.rotation = moon_spin);
        }
    }
}

/// The belt turns as a whole and every asteroid turns about its own Y axis.
pub fn pose_belt(belt: &mut dyn SceneNode, elapsed: Duration) {
    belt.set_local_transform(0, spin(BELT_SPIN, elapsed).into());
    let own_spin = spin(ASTEROID_SPIN, elapsed);
    for asteroids in belt.get_children_mut() {
        asteroids.set_local_transform_all(&mut |asteroid: &mut Instance| asteroid.rotation = own_spin);
    }
}

impl SolarSystemFlow {
    pub async fn new(ctx: &InitContext) -> Self {
        let (device, queue) = (&ctx.device, &ctx.queue);

        let sun_material = textured_material(device, queue, "sun", "2k_sun.jpg", None, [255, 200, 64, 255]).await;
        let (width_segments, height_segments) = SPHERE_SEGMENTS;
        let sun_sphere = uv_sphere(SUN_RADIUS, width_segments, height_segments);
        let sun = model_from_mesh(device, &sun_sphere, "sun", sun_material);
        let sun = ModelNode::from_model(1, 0, device, sun).with_shading(Shading::Unlit);

        let moon_material = textured_material(
            device,
            queue,
            "moon",
            "moon_1024.jpg",
            Some("moon_bump.jpg"),
            [180, 180, 180, 255],
        )
        .await;
        let moon_sphere = uv_sphere(MOON_RADIUS, width_segments, height_segments);
        let moon = model_from_mesh(device, &moon_sphere, "moon", moon_material);

        let mut planets = Vec::with_capacity(PLANETS.len());
        for planet in &PLANETS {
            planets.push(mk_planet(device, queue, planet, &moon).await);
        }

        // a unit circle scaled per planet
        let outline = circle_outline(1.0, ORBIT_SEGMENTS).with_uniform_color([1.0; 4]);
        let outline = model_from_mesh(device, &outline, "orbit", default_material(device, queue, "orbit"));
        let mut orbit_paths = ModelNode::from_model(0, 0, device, outline).with_shading(Shading::Lines);
        orbit_paths.add_instances(
            PLANETS
                .iter()
                .map(|planet| Instance::new().with_scale(planet.orbit))
                .collect(),
        );

        let mut flow = Self {
            device: device.clone(),
            queue: queue.clone(),
            elapsed: Duration::ZERO,
            sun,
            orbit_paths,
            planets,
            belt: None,
        };
        flow.update_nodes();
        flow
    }

    fn mk_belt(&self, asteroid: Model) -> ContainerNode {
        let positions = asteroid_positions(ASTEROIDS, &mut rand::thread_rng());
        let mut asteroids = ModelNode::from_model(0, 0, &self.device, asteroid);
        asteroids.add_instances(
            positions
                .into_iter()
                .map(|position| Instance::from(position).with_scale(ASTEROID_SCALE))
                .collect(),
        );
        let mut belt = ContainerNode::new(1);
        belt.add_child(Box::new(asteroids));
        belt
    }

    fn update_nodes(&mut self) {
        let elapsed = self.elapsed;
        for (planet, system) in PLANETS.iter().zip(self.planets.iter_mut()) {
            pose_planet(system, planet, elapsed);
            system.update_world_transform_all();
            system.write_to_buffers(&self.queue, &self.device);
        }
        if let Some(belt) = &mut self.belt {
            pose_belt(belt, elapsed);
            belt.update_world_transform_all();
            belt.write_to_buffers(&self.queue, &self.device);
        }
        self.sun.update_world_transform_all();
        self.sun.write_to_buffers(&self.queue, &self.device);
        self.orbit_paths.update_world_transform_all();
        self.orbit_paths.write_to_buffers(&self.queue, &self.device);
    }
}

impl GraphicsFlow<(), SolarEvent> for SolarSystemFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), SolarEvent> {
        ctx.clear_colour = wgpu::Color {
            r: 0.0,
            g: 0.0,
            b: 0.02,
            a: 1.0,
        };
        ctx.camera.camera = Camera::new((-2.0, 6.0, 12.0), (0.0, 0.0, 0.0));
        ctx.camera.controller.enabled = true;
        let (width, height) = ctx.size();
        ctx.projection = Projection::perspective(width, height, Deg(45.0), 1.0, 4000.0);
        ctx.light.uniform = LightUniform::point((0.0, 0.0, 0.0), [1.0; 3], 0.15);
        ctx.set_title("Solar system");

        let (device, queue) = (self.device.clone(), self.queue.clone());
        let load: Box<dyn Future<Output = SolarEvent>> = Box::new(async move {
            SolarEvent::AsteroidsLoaded(load_model_obj(ASTEROID_MODEL, &device, &queue).await)
        });
        Out::FutEvent(vec![load])
    }

    fn on_update(&mut self, _: &Context, _: &mut (), dt: Duration) -> Out<(), SolarEvent> {
        self.elapsed += dt;
        self.update_nodes();
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut (), event: SolarEvent) -> Option<SolarEvent> {
        match event {
            SolarEvent::AsteroidsLoaded(Ok(asteroid)) => {
                log::info!("Asteroid belt loaded");
                self.belt = Some(self.mk_belt(asteroid));
                self.update_nodes();
            }
            SolarEvent::AsteroidsLoaded(Err(e)) => {
                log::error!("The asteroid belt is skipped: {e:#}");
            }
        }
        None
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        let mut renders = vec![self.sun.get_render(), self.orbit_paths.get_render()];
        renders.extend(self.planets.iter().map(|planet| planet.get_render()));
        if let Some(belt) = &self.belt {
            renders.push(belt.get_render());
        }
        Render::Composed(renders)
    }
}

pub fn constructor() -> FlowConsturctor<(), SolarEvent> {
    Box::new(|ctx| {
        Box::pin(async move {
            Box::new(SolarSystemFlow::new(&ctx).await) as Box<dyn GraphicsFlow<_, _>>
        })
    })
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Rotation};
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn planets_start_on_the_positive_x_axis() {
        for planet in &PLANETS {
            assert!(close(planet.position(Duration::ZERO), Vector3::new(planet.orbit, 0.0, 0.0)));
        }
    }

    #[test]
    fn planets_stay_on_their_orbit() {
        let earth = PLANETS[2];
        let t = Duration::from_millis(1234);
        let tau = 1234.0 * TIME_SCALE * earth.speed;
        let p = earth.position(t);
        assert!(close(p, Vector3::new(tau.cos() * 20.0, 0.0, tau.sin() * 20.0)));
        assert!((p.magnitude() - earth.orbit).abs() < 1e-3);
    }

    #[test]
    fn inner_planets_are_faster() {
        assert!(PLANETS.windows(2).all(|w| w[0].speed > w[1].speed));
        assert!(PLANETS.windows(2).all(|w| w[0].orbit < w[1].orbit));
    }

    #[test]
    fn only_saturn_and_uranus_have_rings() {
        let ringed: Vec<&str> = PLANETS.iter().filter(|p| p.ring.is_some()).map(|p| p.name).collect();
        assert_eq!(ringed, vec!["saturn", "uranus"]);
    }

    #[test]
    fn moon_layout() {
        assert!(moon_offsets(0).is_empty());
        let single = moon_offsets(1);
        assert!(close(single[0], Vector3::new(3.0 * 1f32.sin(), 0.0, 3.0 * 1f32.cos())));
        let five = moon_offsets(5);
        assert_eq!(five.len(), 5);
        assert!(close(five[0], Vector3::new(0.0, 0.0, 3.0)));
        assert!(close(five[2], Vector3::new(3.0 * 10f32.sin(), 0.0, 3.0 * 10f32.cos())));
        assert!(five.iter().all(|m| (m.magnitude() - MOON_DISTANCE).abs() < 1e-4));
    }

    #[test]
    fn asteroids_lie_in_the_belt() {
        let mut rng = StdRng::seed_from_u64(3);
        let belt = asteroid_positions(ASTEROIDS, &mut rng);
        assert_eq!(belt.len(), ASTEROIDS);
        for p in belt {
            assert_eq!(p.y, 1.0);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!(r >= BELT_RADIUS - 1e-3 && r < BELT_RADIUS + BELT_WIDTH + 1e-3);
        }
    }

    #[test]
    fn spin_is_proportional_to_time() {
        let q = spin(PLANET_SPIN, Duration::from_secs(1));
        let x = q.rotate_vector(Vector3::unit_x());
        let expected = Vector3::new(0.6f32.cos(), 0.0, -(0.6f32.sin()));
        assert!(close(x, expected));
    }

    fn rig(planet: &Planet, ringed: bool) -> ContainerNode {
        let moons = (planet.moons > 0).then(|| {
            let mut moons = ContainerNode::new(0);
            moons.add_instances(moon_offsets(planet.moons).into_iter().map(Instance::from).collect());
            Box::new(moons) as Box<dyn SceneNode>
        });
        let ring = ringed.then(|| {
            let tilt: Instance = Quaternion::from_angle_x(Rad(RING_TILT)).into();
            Box::new(ContainerNode::with_local(tilt)) as Box<dyn SceneNode>
        });
        planet_system(planet, Box::new(ContainerNode::new(1)), moons, ring)
    }

    #[test]
    fn moons_orbit_at_planet_spin_plus_group_spin() {
        let saturn = PLANETS[5];
        let mut system = rig(&saturn, true);
        let elapsed = Duration::from_millis(1500);
        pose_planet(&mut system, &saturn, elapsed);
        system.update_world_transform_all();

        let body = &system.get_children()[0];
        let moons = &body.get_children()[0].get_children()[0];
        let orbit = spin(PLANET_SPIN + MOON_SPIN, elapsed);
        let centre = saturn.position(elapsed);
        let worlds = moons.get_world_transforms();
        assert_eq!(worlds.len(), saturn.moons);
        for (world, offset) in worlds.iter().zip(moon_offsets(saturn.moons)) {
            assert!(close(world.position, centre + orbit.rotate_vector(offset)));
        }
    }

    #[test]
    fn the_ring_turns_with_the_planet_and_keeps_its_tilt() {
        let saturn = PLANETS[5];
        let mut system = rig(&saturn, true);
        let elapsed = Duration::from_secs(3);
        pose_planet(&mut system, &saturn, elapsed);
        system.update_world_transform_all();

        let ring = &system.get_children()[0].get_children()[1];
        let normal = ring.get_world_transforms()[0].rotation.rotate_vector(Vector3::unit_y());
        let tilt = Quaternion::from_angle_x(Rad(RING_TILT));
        let expected = spin(PLANET_SPIN, elapsed).rotate_vector(tilt.rotate_vector(Vector3::unit_y()));
        assert!(close(normal, expected));
        // the tilt itself is not overwritten by posing
        assert_eq!(ring.get_local_transform(0).map(|local| local.rotation), Some(tilt));
    }

    #[test]
    fn a_planet_without_moons_only_spins() {
        let mercury = PLANETS[0];
        let mut system = rig(&mercury, false);
        pose_planet(&mut system, &mercury, Duration::from_secs(1));
        let body = &system.get_children()[0];
        assert!(body.get_children().is_empty());
        let spun = body.get_local_transform(0).map(|local| local.rotation);
        assert_eq!(spun, Some(spin(PLANET_SPIN, Duration::from_secs(1))));
    }

    #[test]
    fn asteroids_spin_inside_the_turning_belt() {
        let start = Vector3::new(BELT_RADIUS, 1.0, 0.0);
        let mut asteroids = ContainerNode::new(0);
        asteroids.add_instances(vec![Instance::from(start).with_scale(ASTEROID_SCALE)]);
        let mut belt = ContainerNode::new(1);
        belt.add_child(Box::new(asteroids));

        let elapsed = Duration::from_secs(2);
        pose_belt(&mut belt, elapsed);
        belt.update_world_transform_all();

        let asteroid = &belt.get_children()[0].get_world_transforms()[0];
        assert!(close(asteroid.position, spin(BELT_SPIN, elapsed).rotate_vector(start)));
        let facing = asteroid.rotation.rotate_vector(Vector3::unit_x());
        let expected = spin(BELT_SPIN + ASTEROID_SPIN, elapsed).rotate_vector(Vector3::unit_x());
        assert!(close(facing, expected));
        assert!((asteroid.scale.x - ASTEROID_SCALE).abs() < 1e-9);
    }
}

//! One-time construction of the solar system scene.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Quat, Vec3};

use crate::asset::TextureProvider;
use crate::color::Color;
use crate::geometry::Geometry;
use crate::graph::{Mesh, NodeId, NodeKind, Scene, Transform};
use crate::light::{AmbientLight, HemisphereLight};
use crate::material::Material;
use crate::planets::{PLANET_RING_RADIUS, PlanetConfig, SUN_RADIUS, validate_table};

pub const SUN_TEXTURE: &str = "sun";
pub const BACKGROUND_TEXTURE: &str = "stars";

/// Tube radius shared by orbit paths and planet rings.
pub const RING_TUBE: f32 = 0.05;
const RING_RADIAL_SEGMENTS: u32 = 16;
const RING_TUBULAR_SEGMENTS: u32 = 100;
const SPHERE_SEGMENTS: u32 = 32;

/// Tilt of planet rings about X.
pub const PLANET_RING_TILT: f32 = PI / 2.5;

/// Ambient light color (sRGB hex).
pub const AMBIENT_COLOR: u32 = 0x404040;
/// Hemisphere light color from above.
pub const HEMISPHERE_SKY: u32 = 0xffffbb;
/// Hemisphere light color from below.
pub const HEMISPHERE_GROUND: u32 = 0x080820;

/// Handles to everything the animation touches, index-aligned with `planets`.
#[derive(Debug, Clone)]
pub struct SolarSystem {
    /// The table the scene was built from.
    pub planets: Vec<PlanetConfig>,
    /// Sun sphere, a direct child of the scene root.
    pub sun: NodeId,
    /// Per-planet groups spun about the sun to move the planet along its orbit.
    pub orbit_groups: Vec<NodeId>,
    /// Per-planet spheres, children of their orbit group.
    pub planet_bodies: Vec<NodeId>,
    /// Per-planet orbit path rings centred on the sun.
    pub orbit_paths: Vec<NodeId>,
    /// Extra rings of ringed planets, in table order.
    pub rings: Vec<NodeId>,
    /// Ambient then hemisphere light.
    pub lights: Vec<NodeId>,
}

impl SolarSystem {
    /// Number of planets.
    pub fn len(&self) -> usize {
        self.planets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planets.is_empty()
    }

    /// Table index of the planet called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.planets.iter().position(|p| p.name == name)
    }
}

/// Rotation that turns an XY-plane torus into a ring around the vertical axis.
pub fn orbit_path_orientation() -> Quat {
    Quat::from_rotation_z(FRAC_PI_2) * Quat::from_rotation_y(FRAC_PI_2)
}

/// Insert the sun, one orbit group per planet, the lights and the background
/// into `scene`.
///
/// Never fails. Table problems are logged and the scene is built regardless;
/// textures that are not ready yet render with a fallback.
pub fn build_solar_system(
    scene: &mut Scene,
    planets: &[PlanetConfig],
    textures: &dyn TextureProvider,
) -> SolarSystem {
    for warning in validate_table(planets) {
        tracing::warn!("planet table: {warning}");
    }

    let orbit_material = Material::basic(Color::WHITE);
    let graph = &mut scene.graph;

    let mut orbit_groups = Vec::with_capacity(planets.len());
    let mut planet_bodies = Vec::with_capacity(planets.len());
    let mut orbit_paths = Vec::with_capacity(planets.len());
    let mut rings = Vec::new();

    for planet in planets {
        let group = graph.add_root(
            format!("{}-orbit-group", planet.name),
            Transform::default(),
            NodeKind::Group,
        );

        let path = graph.add_child(
            group,
            format!("{}-orbit-path", planet.name),
            Transform::default().with_orientation(orbit_path_orientation()),
            NodeKind::Mesh(Mesh {
                geometry: Geometry::torus(
                    planet.orbit_distance,
                    RING_TUBE,
                    RING_RADIAL_SEGMENTS,
                    RING_TUBULAR_SEGMENTS,
                ),
                material: orbit_material.clone(),
            }),
        );

        let offset = Vec3::new(planet.orbit_distance, 0.0, 0.0);
        let body = graph.add_child(
            group,
            planet.name,
            Transform::from_translation(offset),
            NodeKind::Mesh(Mesh {
                geometry: Geometry::sphere(planet.size_ratio, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
                material: Material::textured(textures.texture(planet.name)),
            }),
        );

        if planet.extra_ring {
            let ring = graph.add_child(
                group,
                format!("{}-ring", planet.name),
                Transform::from_translation(offset)
                    .with_orientation(Quat::from_rotation_x(PLANET_RING_TILT)),
                NodeKind::Mesh(Mesh {
                    geometry: Geometry::torus(
                        PLANET_RING_RADIUS,
                        RING_TUBE,
                        RING_RADIAL_SEGMENTS,
                        RING_TUBULAR_SEGMENTS,
                    ),
                    material: orbit_material.clone(),
                }),
            );
            rings.push(ring);
        }

        orbit_groups.push(group);
        planet_bodies.push(body);
        orbit_paths.push(path);
    }

    let sun = graph.add_root(
        "sun",
        Transform::default(),
        NodeKind::Mesh(Mesh {
            geometry: Geometry::sphere(SUN_RADIUS, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
            material: Material::textured(textures.texture(SUN_TEXTURE)),
        }),
    );

    let lights = vec![
        graph.add_root(
            "ambient-light",
            Transform::default(),
            NodeKind::AmbientLight(AmbientLight::new(Color::from_hex(AMBIENT_COLOR), 1.0)),
        ),
        graph.add_root(
            "hemisphere-light",
            Transform::default(),
            NodeKind::HemisphereLight(HemisphereLight::new(
                Color::from_hex(HEMISPHERE_SKY),
                Color::from_hex(HEMISPHERE_GROUND),
                1.0,
            )),
        ),
    ];

    scene.background = Some(textures.texture(BACKGROUND_TEXTURE));

    tracing::info!(
        "Built solar system: {} planets, {} rings, {} nodes",
        planets.len(),
        rings.len(),
        scene.graph.len()
    );

    SolarSystem {
        planets: planets.to_vec(),
        sun,
        orbit_groups,
        planet_bodies,
        orbit_paths,
        rings,
        lights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{StaticTextureProvider, TextureImage};
    use crate::planets::REFERENCE_PLANETS;

    fn build() -> (Scene, SolarSystem, StaticTextureProvider) {
        let textures = StaticTextureProvider::new();
        let mut scene = Scene::new();
        let system = build_solar_system(&mut scene, &REFERENCE_PLANETS, &textures);
        (scene, system, textures)
    }

    fn world_origin(scene: &Scene, id: NodeId) -> Vec3 {
        scene.graph.world_matrix(id).transform_point3(Vec3::ZERO)
    }

    #[test]
    fn test_lists_are_index_aligned() {
        let (scene, system, _) = build();
        assert_eq!(system.orbit_groups.len(), 8);
        assert_eq!(system.planet_bodies.len(), 8);
        assert_eq!(system.orbit_paths.len(), 8);

        for (i, planet) in REFERENCE_PLANETS.iter().enumerate() {
            let body = scene.graph.node(system.planet_bodies[i]).unwrap();
            assert_eq!(body.name, planet.name);
            assert_eq!(body.parent(), Some(system.orbit_groups[i]));
        }
    }

    #[test]
    fn test_only_ringed_group_has_three_children() {
        let (scene, system, _) = build();
        let counts: Vec<_> = system
            .orbit_groups
            .iter()
            .map(|&g| scene.graph.children(g).len())
            .collect();
        assert_eq!(counts, [2, 2, 2, 2, 2, 3, 2, 2]);
        assert_eq!(system.rings.len(), 1);
        let ring = scene.graph.node(system.rings[0]).unwrap();
        assert_eq!(ring.parent(), Some(system.orbit_groups[5]));
    }

    #[test]
    fn test_planets_sit_at_orbit_distance() {
        let (scene, system, _) = build();
        for (i, planet) in REFERENCE_PLANETS.iter().enumerate() {
            let pos = world_origin(&scene, system.planet_bodies[i]);
            assert!((pos - Vec3::new(planet.orbit_distance, 0.0, 0.0)).length() < 1e-5);
        }
        let ring = world_origin(&scene, system.rings[0]);
        assert!((ring - Vec3::new(50.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_orbit_paths_are_horizontal() {
        let (scene, system, _) = build();
        for &path in &system.orbit_paths {
            // The torus normal is local +Z.
            let normal = scene.graph.world_matrix(path).transform_vector3(Vec3::Z);
            assert!((normal - Vec3::Y).length() < 1e-5, "normal = {normal}");
        }
    }

    #[test]
    fn test_planet_ring_is_tilted() {
        let (scene, system, _) = build();
        let normal = scene
            .graph
            .world_matrix(system.rings[0])
            .transform_vector3(Vec3::Z);
        // Angle between the ring's plane and the orbital plane.
        let tilt = normal.dot(Vec3::Y).abs().acos();
        assert!((tilt - (FRAC_PI_2 - PLANET_RING_TILT)).abs() < 1e-4, "tilt = {tilt}");
    }

    #[test]
    fn test_sun_lights_and_background() {
        let (scene, system, _) = build();
        let sun = scene.graph.node(system.sun).unwrap();
        let mesh = sun.mesh().unwrap();
        assert_eq!(mesh.geometry, Geometry::sphere(10.0, 32, 32));
        assert_eq!(mesh.material.map().unwrap().key(), SUN_TEXTURE);
        assert_eq!(system.lights.len(), 2);
        assert!(matches!(
            scene.graph.node(system.lights[0]).unwrap().kind,
            NodeKind::AmbientLight(_)
        ));
        assert_eq!(scene.background.as_ref().unwrap().key(), BACKGROUND_TEXTURE);
    }

    #[test]
    fn test_all_angles_start_at_zero() {
        let (scene, system, _) = build();
        for &id in system
            .orbit_groups
            .iter()
            .chain(&system.planet_bodies)
            .chain([&system.sun])
        {
            assert_eq!(scene.graph.spin(id), Some(0.0));
        }
    }

    #[test]
    fn test_building_twice_is_isomorphic() {
        let (a, sys_a, _) = build();
        let (b, sys_b, _) = build();
        assert_eq!(a.graph.len(), b.graph.len());
        assert_eq!(sys_a.orbit_groups, sys_b.orbit_groups);

        let snapshot = |scene: &Scene| {
            let mut nodes = Vec::new();
            scene.graph.visit(|_, node, world| {
                nodes.push((node.name.clone(), world, node.children().len()));
            });
            nodes
        };
        assert_eq!(snapshot(&a), snapshot(&b));
    }

    #[test]
    fn test_textures_resolve_after_build() {
        let (scene, system, textures) = build();
        let earth = scene.graph.node(system.planet_bodies[2]).unwrap();
        let map = earth.mesh().unwrap().material.map().unwrap().clone();
        assert!(!map.is_resolved());

        textures.insert("earth", TextureImage::solid([0, 0, 255, 255]));
        assert!(map.is_resolved());
    }

    #[test]
    fn test_ring_flag_generalises() {
        let mut planets = REFERENCE_PLANETS.to_vec();
        planets[4].extra_ring = true;
        planets[6].extra_ring = true;
        let textures = StaticTextureProvider::new();
        let mut scene = Scene::new();
        let system = build_solar_system(&mut scene, &planets, &textures);
        assert_eq!(system.rings.len(), 3);
    }

    #[test]
    fn test_empty_table_still_builds_sun() {
        let textures = StaticTextureProvider::new();
        let mut scene = Scene::new();
        let system = build_solar_system(&mut scene, &[], &textures);
        assert!(system.is_empty());
        assert!(scene.graph.node(system.sun).is_some());
    }
}

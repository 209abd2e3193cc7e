//! Sphere and torus geometry descriptors and their triangle meshes.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// A parametric shape. The renderer turns each distinct shape into one GPU mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// UV sphere centred on the origin, poles on the Y axis.
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Torus centred on the origin, lying in the XY plane.
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
}

/// Hashable identity of a [`Geometry`], used to share meshes between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKey {
    Sphere(u32, u32, u32),
    Torus(u32, u32, u32, u32),
}

/// Triangle mesh produced from a [`Geometry`].
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    /// Counter-clockwise triangles.
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl Geometry {
    pub const fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::Sphere {
            radius,
            width_segments,
            height_segments,
        }
    }

    pub const fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        Self::Torus {
            radius,
            tube,
            radial_segments,
            tubular_segments,
        }
    }

    pub fn key(&self) -> GeometryKey {
        match *self {
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => GeometryKey::Sphere(radius.to_bits(), width_segments, height_segments),
            Self::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => GeometryKey::Torus(
                radius.to_bits(),
                tube.to_bits(),
                radial_segments,
                tubular_segments,
            ),
        }
    }

    /// Largest distance of any vertex from the local origin.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Sphere { radius, .. } => radius,
            Self::Torus { radius, tube, .. } => radius + tube,
        }
    }

    pub fn generate(&self) -> MeshData {
        match *self {
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => generate_sphere(radius, width_segments.max(3), height_segments.max(2)),
            Self::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => generate_torus(radius, tube, radial_segments.max(3), tubular_segments.max(3)),
        }
    }
}

/// Latitude/longitude sphere. The seam column is duplicated so UVs wrap cleanly.
fn generate_sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let columns = width_segments + 1;
    let rows = height_segments + 1;
    let vertex_count = (columns * rows) as usize;

    let mut mesh = MeshData {
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        indices: Vec::with_capacity((width_segments * height_segments * 6) as usize),
    };

    for iy in 0..rows {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;
        for ix in 0..columns {
            let u = ix as f32 / width_segments as f32;
            let phi = u * TAU;
            let normal = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            mesh.positions.push(normal * radius);
            mesh.normals.push(normal);
            mesh.uvs.push([u, v]);
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * columns + ix + 1;
            let b = iy * columns + ix;
            let c = (iy + 1) * columns + ix;
            let d = (iy + 1) * columns + ix + 1;

            // The pole rows collapse to a point; skip their degenerate halves.
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    mesh
}

fn generate_torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> MeshData {
    let columns = tubular_segments + 1;
    let rows = radial_segments + 1;
    let vertex_count = (columns * rows) as usize;

    let mut mesh = MeshData {
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        indices: Vec::with_capacity((radial_segments * tubular_segments * 6) as usize),
    };

    for j in 0..rows {
        let v = j as f32 / radial_segments as f32 * TAU;
        for i in 0..columns {
            let u = i as f32 / tubular_segments as f32 * TAU;
            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let centre = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            mesh.positions.push(position);
            mesh.normals.push((position - centre).normalize_or_zero());
            mesh.uvs.push([
                i as f32 / tubular_segments as f32,
                j as f32 / radial_segments as f32,
            ]);
        }
    }

    for j in 1..rows {
        for i in 1..columns {
            let a = columns * j + i - 1;
            let b = columns * (j - 1) + i - 1;
            let c = columns * (j - 1) + i;
            let d = columns * j + i;
            mesh.indices.extend_from_slice(&[a, b, d]);
            mesh.indices.extend_from_slice(&[b, c, d]);
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_vertices_on_radius() {
        let mesh = Geometry::sphere(10.0, 32, 32).generate();
        for pos in &mesh.positions {
            let len = pos.length();
            assert!((len - 10.0).abs() < 1e-4, "vertex off sphere: length = {len}");
        }
    }

    #[test]
    fn test_sphere_counts() {
        let mesh = Geometry::sphere(1.0, 32, 32).generate();
        assert_eq!(mesh.vertex_count(), 33 * 33);
        // Two triangles per quad, minus one per quad on each pole row.
        assert_eq!(mesh.triangle_count(), 32 * 32 * 2 - 2 * 32);
    }

    #[test]
    fn test_sphere_normals_are_unit_and_outward() {
        let mesh = Geometry::sphere(2.5, 16, 12).generate();
        for (pos, normal) in mesh.positions.iter().zip(&mesh.normals) {
            assert!((normal.length() - 1.0).abs() < 1e-5);
            assert!(pos.normalize().dot(*normal) > 0.999);
        }
    }

    #[test]
    fn test_sphere_triangles_wind_outward() {
        let mesh = Geometry::sphere(1.0, 12, 8).generate();
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.positions[i as usize]);
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0, "inward-facing triangle");
        }
    }

    #[test]
    fn test_torus_lies_in_xy_plane() {
        let mesh = Geometry::torus(25.0, 0.05, 16, 100).generate();
        for pos in &mesh.positions {
            assert!(pos.z.abs() <= 0.05 + 1e-5);
            let planar = (pos.x * pos.x + pos.y * pos.y).sqrt();
            assert!((planar - 25.0).abs() <= 0.05 + 1e-4);
        }
    }

    #[test]
    fn test_torus_counts() {
        let mesh = Geometry::torus(5.0, 0.05, 16, 100).generate();
        assert_eq!(mesh.vertex_count(), 17 * 101);
        assert_eq!(mesh.triangle_count(), 16 * 100 * 2);
    }

    #[test]
    fn test_indices_in_bounds() {
        for geometry in [Geometry::sphere(1.0, 8, 6), Geometry::torus(3.0, 0.5, 6, 12)] {
            let mesh = geometry.generate();
            let n = mesh.vertex_count() as u32;
            assert!(mesh.indices.iter().all(|&i| i < n));
            assert_eq!(mesh.normals.len(), mesh.positions.len());
            assert_eq!(mesh.uvs.len(), mesh.positions.len());
        }
    }

    #[test]
    fn test_uvs_in_range() {
        let mesh = Geometry::sphere(1.0, 32, 32).generate();
        for uv in &mesh.uvs {
            assert!((0.0..=1.0).contains(&uv[0]));
            assert!((0.0..=1.0).contains(&uv[1]));
        }
    }

    #[test]
    fn test_key_distinguishes_shapes() {
        let a = Geometry::torus(15.0, 0.05, 16, 100);
        let b = Geometry::torus(20.0, 0.05, 16, 100);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), Geometry::torus(15.0, 0.05, 16, 100).key());
    }
}

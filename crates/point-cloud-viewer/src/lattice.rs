//! The fixed particle lattice: one point per depth pixel.

use rayon::prelude::*;

/// Per-particle vertex data uploaded once at startup.
/// Must match the instance inputs of `point_cloud.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Particle {
    /// Position on the z = 0 plane, spanning [-width, width] x [-height, height].
    pub position: [f32; 3],
    /// Texture coordinate in [0,1]², bottom-left origin.
    pub tex_coord: [f32; 2],
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LatticeError {
    #[error("lattice needs at least 2x2 particles, got {width}x{height}")]
    Degenerate { width: u32, height: u32 },
}

/// Immutable grid of `width * height` particles.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleLattice {
    width: u32,
    height: u32,
    particles: Vec<Particle>,
}

impl ParticleLattice {
    /// Builds the lattice for a sensor of `width` x `height` pixels.
    ///
    /// Particles are ordered x-major: all rows of column 0, then column 1,
    /// and so on. The renderer consumes the buffer positionally.
    pub fn build(width: u32, height: u32) -> Result<Self, LatticeError> {
        if width < 2 || height < 2 {
            return Err(LatticeError::Degenerate { width, height });
        }

        let (w, h) = (width as f32, height as f32);
        let x_den = (width - 1) as f32;
        let y_den = (height - 1) as f32;

        let particles = (0..width)
            .into_par_iter()
            .flat_map_iter(|x| {
                (0..height).map(move |y| {
                    let x_per = x as f32 / x_den;
                    let y_per = y as f32 / y_den;
                    Particle {
                        position: [(x_per * 2.0 - 1.0) * w, (y_per * 2.0 - 1.0) * h, 0.0],
                        tex_coord: [x_per, 1.0 - y_per],
                    }
                })
            })
            .collect();

        Ok(Self {
            width,
            height,
            particles,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Raw vertex bytes for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lattice: &ParticleLattice, x: u32, y: u32) -> Particle {
        lattice.particles()[(x * lattice.height() + y) as usize]
    }

    #[test]
    fn count_matches_resolution() {
        for (w, h) in [(2, 2), (3, 7), (640, 480)] {
            let lattice = ParticleLattice::build(w, h).unwrap();
            assert_eq!(lattice.len(), (w * h) as usize);
        }
    }

    #[test]
    fn two_by_two_order_and_values() {
        let lattice = ParticleLattice::build(2, 2).unwrap();
        let expected = [
            ([-2.0, -2.0, 0.0], [0.0, 1.0]),
            ([-2.0, 2.0, 0.0], [0.0, 0.0]),
            ([2.0, -2.0, 0.0], [1.0, 1.0]),
            ([2.0, 2.0, 0.0], [1.0, 0.0]),
        ];
        assert_eq!(lattice.len(), 4);
        for (p, (pos, tc)) in lattice.particles().iter().zip(expected) {
            assert_eq!(p.position, pos);
            assert_eq!(p.tex_coord, tc);
        }
    }

    #[test]
    fn corners_span_the_plane() {
        let (w, h) = (640, 480);
        let lattice = ParticleLattice::build(w, h).unwrap();

        let first = at(&lattice, 0, 0);
        assert_eq!(first.position, [-(w as f32), -(h as f32), 0.0]);
        assert_eq!(first.tex_coord, [0.0, 1.0]);

        let last = at(&lattice, w - 1, h - 1);
        assert_eq!(last.position, [w as f32, h as f32, 0.0]);
        assert_eq!(last.tex_coord, [1.0, 0.0]);
    }

    #[test]
    fn tex_v_decreases_down_each_column() {
        let lattice = ParticleLattice::build(5, 9).unwrap();
        for x in 0..5 {
            for y in 1..9 {
                let prev = at(&lattice, x, y - 1).tex_coord[1];
                let cur = at(&lattice, x, y).tex_coord[1];
                assert!(cur < prev);
                assert_eq!(cur, 1.0 - y as f32 / 8.0);
            }
        }
    }

    #[test]
    fn all_particles_lie_on_z_zero() {
        let lattice = ParticleLattice::build(16, 12).unwrap();
        assert!(lattice.particles().iter().all(|p| p.position[2] == 0.0));
    }

    #[test]
    fn rebuild_is_bitwise_identical() {
        let a = ParticleLattice::build(64, 48).unwrap();
        let b = ParticleLattice::build(64, 48).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn byte_layout_is_twenty_bytes_per_particle() {
        let lattice = ParticleLattice::build(3, 3).unwrap();
        assert_eq!(std::mem::size_of::<Particle>(), 20);
        assert_eq!(lattice.as_bytes().len(), 9 * 20);
    }

    #[test]
    fn degenerate_sizes_are_rejected() {
        for (w, h) in [(1, 480), (640, 1), (0, 0), (1, 1)] {
            assert_eq!(
                ParticleLattice::build(w, h),
                Err(LatticeError::Degenerate {
                    width: w,
                    height: h
                })
            );
        }
    }
}

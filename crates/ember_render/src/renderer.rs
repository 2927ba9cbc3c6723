//! Parallel image renderer.
//!
//! Rows are rendered independently on rayon's pool. Each row owns a
//! generator seeded from the render seed and the row index, so an image is
//! reproducible for a given seed no matter how rows land on threads.

use crate::config::RenderConfig;
use crate::integrator::PathIntegrator;
use crate::sampling::gen_f32;
use crate::scene::Scene;
use crate::{Camera, Color};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Progress report sent after every finished row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    pub rows_done: usize,
    pub rows_total: usize,
}

/// Accumulated radiance per pixel, row-major with row 0 at the top.
///
/// Pixels hold the raw sum over all samples; [`ImageBuffer::to_rgb8`]
/// averages and tone-maps.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    samples_per_pixel: u32,
    pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32, samples_per_pixel: u32) -> Self {
        Self {
            width,
            height,
            samples_per_pixel,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    /// Summed radiance at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Overwrite the summed radiance at (x, y).
    pub fn set(&mut self, x: u32, y: u32, sum: Color) {
        self.pixels[y as usize * self.width as usize + x as usize] = sum;
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Average, gamma-correct and quantize every pixel to 8-bit RGB.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let scale = 1.0 / self.samples_per_pixel.max(1) as f32;
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for sum in &self.pixels {
            bytes.extend_from_slice(&color_to_rgb8(*sum * scale));
        }
        bytes
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert an averaged linear color to 8-bit RGB.
///
/// Channels are clamped to [0, 0.999] before scaling by 256; NaN maps to 0.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let quantize = |c: f32| {
        let g = linear_to_gamma(c);
        let g = if g.is_nan() { 0.0 } else { g.clamp(0.0, 0.999) };
        (256.0 * g) as u8
    };
    [quantize(color.x), quantize(color.y), quantize(color.z)]
}

/// Generator seed for one image row.
#[inline]
fn row_seed(seed: u64, row: usize) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ row as u64
}

/// Render the scene into a new image buffer.
///
/// `on_row` is called from worker threads after each finished row.
pub fn render<F>(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    integrator: &PathIntegrator,
    on_row: F,
) -> ImageBuffer
where
    F: Fn(RenderProgress) + Sync,
{
    let width = config.width.max(1);
    let height = config.height.max(1);
    let spp = config.samples_per_pixel.max(1);
    let background = config.background.unwrap_or_else(|| scene.background());
    let lights = scene.lights();

    log::info!(
        "Rendering {}x{} at {} spp, max depth {}, {} threads",
        width,
        height,
        spp,
        config.max_depth,
        rayon::current_num_threads()
    );
    let start = Instant::now();

    let mut image = ImageBuffer::new(width, height, spp);
    let rows_done = AtomicUsize::new(0);
    let rows_total = height as usize;

    // Guard the 1-pixel-wide/tall case
    let u_denom = (width - 1).max(1) as f32;
    let v_denom = (height - 1).max(1) as f32;

    image
        .pixels
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let mut rng = SmallRng::seed_from_u64(row_seed(config.seed, y));
            let flipped_y = (height as usize - 1 - y) as f32;

            for (x, pixel) in row.iter_mut().enumerate() {
                let mut sum = Color::ZERO;
                for _ in 0..spp {
                    let u = (x as f32 + gen_f32(&mut rng)) / u_denom;
                    let v = (flipped_y + gen_f32(&mut rng)) / v_denom;
                    let ray = camera.get_ray(u, v, &mut rng);
                    let depth = config.max_depth;
                    sum += integrator.li(&ray, background, scene, lights, depth, &mut rng);
                }
                *pixel = sum;
            }

            let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
            on_row(RenderProgress {
                rows_done: done,
                rows_total,
            });
        });

    log::info!("Render finished in {:.2?}", start.elapsed());
    image
}

//! Image output: tonemapping and the ASCII PPM writer.
//!
//! The writer only reads pixel values; it never touches the tape.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::autograd::Vec3;

const GAMMA: f64 = 2.2;

/// Maps linear radiance to display space: clamp to [0, 1], then gamma
/// compression.
#[must_use]
pub fn tonemap(x: f64) -> f64 {
    x.clamp(0.0, 1.0).powf(1.0 / GAMMA)
}

/// Writes a row-major, top-to-bottom pixel buffer as ASCII PPM (`P3`),
/// one `r g b` triple per line in [0, 255].
///
/// # Panics
///
/// Panics when the buffer does not hold `width * height` pixels.
pub fn write_ppm(path: &Path, pixels: &[Vec3], width: usize, height: usize) -> io::Result<()> {
    assert_eq!(
        pixels.len(),
        width * height,
        "write_ppm: buffer does not match {width}x{height}"
    );

    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "P3\n{width} {height}\n255")?;
    for px in pixels {
        let [r, g, b] = px.value();
        writeln!(
            out,
            "{} {} {}",
            (tonemap(r) * 255.0) as u32,
            (tonemap(g) * 255.0) as u32,
            (tonemap(b) * 255.0) as u32
        )?;
    }
    out.flush()
}

//! Image I/O

use crate::spectrum::*;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes an RGB image as a little-endian PFM file.
///
/// * `path`   - Output file path.
/// * `width`  - Image width.
/// * `height` - Image height.
/// * `pixels` - Pixels in row major order starting at the top left.
pub fn write_pfm(path: &Path, width: usize, height: usize, pixels: &[Spectrum]) -> io::Result<()> {
    if pixels.len() != width * height {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("expected {} pixels, got {}", width * height, pixels.len()),
        ));
    }

    info!("Writing image {} with resolution {}x{}", path.display(), width, height);
    let mut file = BufWriter::new(File::create(path)?);

    // Only write 3 channel PFMs. A negative scale marks little-endian data.
    write!(file, "PF\n{} {}\n-1.0\n", width, height)?;

    // Rows are stored bottom to top.
    for y in (0..height).rev() {
        for pixel in &pixels[y * width..(y + 1) * width] {
            for v in pixel.samples() {
                file.write_f32::<LittleEndian>(*v)?;
            }
        }
    }

    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn writes_header_and_rows_bottom_up() {
        let path = env::temp_dir().join(format!("write_pfm_{}.pfm", std::process::id()));
        let pixels = vec![Spectrum::new(1.0), Spectrum::new(2.0)];
        write_pfm(&path, 1, 2, &pixels).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let header = b"PF\n1 2\n-1.0\n";
        assert_eq!(&bytes[..header.len()], header);
        let data = &bytes[header.len()..];
        assert_eq!(data.len(), 2 * 3 * 4);
        assert_eq!(&data[..4], &2.0_f32.to_le_bytes());
        assert_eq!(&data[12..16], &1.0_f32.to_le_bytes());
    }

    #[test]
    fn rejects_wrong_pixel_count() {
        let path = env::temp_dir().join("write_pfm_wrong_count.pfm");
        assert!(write_pfm(&path, 2, 2, &[Spectrum::ZERO]).is_err());
    }
}

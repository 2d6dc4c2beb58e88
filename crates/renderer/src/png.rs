//! PNG encoding for rendered frames.
//!
//! Frames are written as 8-bit RGBA (color type 6) with a single IDAT chunk
//! and no row filtering. tiny-skia stores premultiplied pixels, so
//! [`encode_pixmap`] demultiplies before encoding.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use rayon::prelude::*;
use river_common::{HeatmapError, HeatmapResult};
use tiny_skia::Pixmap;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Rows per parallel work item when building the filtered image
const ROWS_PER_CHUNK: usize = 16;

/// Encode straight (non-premultiplied) RGBA pixels as PNG.
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> HeatmapResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(HeatmapError::Encode(format!(
            "image must not be empty, got {}x{}",
            width, height
        )));
    }
    let row_len = width as usize * 4;
    let expected = row_len * height as usize;
    if rgba.len() != expected {
        return Err(HeatmapError::Encode(format!(
            "expected {} bytes for {}x{} RGBA, got {}",
            expected,
            width,
            height,
            rgba.len()
        )));
    }

    let raw = filtered_rows(rgba, row_len);

    let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::fast());
    encoder
        .write_all(&raw)
        .map_err(|e| HeatmapError::Encode(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| HeatmapError::Encode(e.to_string()))?;

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[
        8, // bit depth
        6, // color type: RGBA
        0, // compression
        0, // filter method
        0, // no interlace
    ]);

    let mut png = Vec::with_capacity(compressed.len() + 64);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr);
    write_chunk(&mut png, b"IDAT", &compressed);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Encode a tiny-skia pixmap, converting from premultiplied alpha.
pub fn encode_pixmap(pixmap: &Pixmap) -> HeatmapResult<Vec<u8>> {
    let rgba: Vec<u8> = pixmap
        .pixels()
        .par_iter()
        .flat_map_iter(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    encode_png(pixmap.width(), pixmap.height(), &rgba)
}

/// Prefix every row with filter type 0 (None).
fn filtered_rows(rgba: &[u8], row_len: usize) -> Vec<u8> {
    rgba.par_chunks(row_len * ROWS_PER_CHUNK)
        .flat_map_iter(|rows| {
            let mut out = Vec::with_capacity(rows.len() + rows.len() / row_len);
            for row in rows.chunks(row_len) {
                out.push(0);
                out.extend_from_slice(row);
            }
            out
        })
        .collect()
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_rows_prefix() {
        let rgba = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let raw = filtered_rows(&rgba, 4);
        assert_eq!(raw, vec![0, 1, 2, 3, 4, 0, 5, 6, 7, 8]);
    }
}

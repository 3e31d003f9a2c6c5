//! Avatar fetching and PNG grid compositing for the `players` slash
//! command (spec §4.6, §9).

use image::{DynamicImage, GenericImage, ImageFormat, RgbaImage};

use crate::error::BridgeError;

const PER_ROW: u32 = 5;
const PADDING: u32 = 4;

/// Composites a list of same-size square avatar thumbnails into a single
/// PNG, `per_row` per row with `pad` pixels between thumbnails.
///
/// Returns `None` if `images` is empty (the caller should send the embed
/// without an attachment in that case).
pub fn composite_grid(images: &[Vec<u8>], size: u32, per_row: u32, pad: u32) -> Result<Option<Vec<u8>>, BridgeError> {
    if images.is_empty() {
        return Ok(None);
    }

    let decoded: Vec<DynamicImage> = images
        .iter()
        .filter_map(|bytes| image::load_from_memory(bytes).ok())
        .collect();

    if decoded.is_empty() {
        return Ok(None);
    }

    let count = decoded.len() as u32;
    let cols = per_row.min(count);
    let rows = count.div_ceil(per_row);

    let width = cols * size + cols.saturating_sub(1) * pad;
    let height = rows * size + rows.saturating_sub(1) * pad;

    let mut canvas = RgbaImage::new(width, height);

    for (idx, avatar) in decoded.iter().enumerate() {
        let idx = idx as u32;
        let col = idx % per_row;
        let row = idx / per_row;

        let x = col * (size + pad);
        let y = row * (size + pad);

        let thumbnail = avatar.resize_exact(size, size, image::imageops::FilterType::Nearest);
        canvas.copy_from(&thumbnail.to_rgba8(), x, y)?;
    }

    let mut out = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas).write_to(&mut out, ImageFormat::Png)?;
    Ok(Some(out.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_png(size: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(size, size, image::Rgba([255, 0, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn empty_list_yields_none() {
        assert!(composite_grid(&[], 32, 5, 4).unwrap().is_none());
    }

    #[test]
    fn seven_avatars_grid_is_176_by_68() {
        let avatars: Vec<Vec<u8>> = (0..7).map(|_| solid_png(32)).collect();
        let png = composite_grid(&avatars, 32, PER_ROW, PADDING).unwrap().unwrap();

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 176);
        assert_eq!(decoded.height(), 68);
    }

    #[test]
    fn undecodable_avatar_bytes_are_skipped() {
        let avatars = vec![solid_png(32), b"not a png".to_vec()];
        let png = composite_grid(&avatars, 32, PER_ROW, PADDING).unwrap().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        // The undecodable entry is dropped, leaving a single-avatar grid.
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 32);
    }
}

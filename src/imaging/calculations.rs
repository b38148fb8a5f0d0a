//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions for a bounded resize.
///
/// The scale factor is `min(max_edge / width, max_edge / height)`, so the
/// longer edge lands on `max_edge`. Sources already inside the bound are left
/// at their original size unless `allow_upscale` is set, in which case they are
/// enlarged until the longer edge reaches `max_edge`.
///
/// Each output edge is at least 1px.
///
/// # Examples
/// ```
/// # use companion_core::imaging::calculate_resize_dimensions;
/// assert_eq!(calculate_resize_dimensions((4000, 3000), 1200, false), (1200, 900));
/// assert_eq!(calculate_resize_dimensions((600, 400), 1200, false), (600, 400));
/// assert_eq!(calculate_resize_dimensions((600, 400), 1200, true), (1200, 800));
/// ```
pub fn calculate_resize_dimensions(
    source: (u32, u32),
    max_edge: u32,
    allow_upscale: bool,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return (src_w.max(1), src_h.max(1));
    }

    let ratio = (max_edge as f64 / src_w as f64).min(max_edge as f64 / src_h as f64);
    let ratio = if allow_upscale { ratio } else { ratio.min(1.0) };

    let w = ((src_w as f64 * ratio).round() as u32).max(1);
    let h = ((src_h as f64 * ratio).round() as u32).max(1);
    (w, h)
}

/// A square region of the source image, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// Calculate the centered square crop of an image.
///
/// The square's edge is the shorter source edge; the excess on the longer
/// axis is split evenly (odd remainders round toward the top-left).
pub fn calculate_square_crop(source: (u32, u32)) -> CropRegion {
    let (src_w, src_h) = source;
    let size = src_w.min(src_h);

    CropRegion {
        x: (src_w - size) / 2,
        y: (src_h - size) / 2,
        size,
    }
}

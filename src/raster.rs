//! CPU pixel operations over premultiplied RGBA8 buffers.
//!
//! Everything here is integer math on `[u8; 4]` pixels; buffers are row-major
//! `width * height * 4` bytes. All drawing clips against an explicit rectangle
//! so scene regions can never bleed into each other.

pub type PremulRgba8 = [u8; 4];

/// Integer pixel rectangle. Signed so off-canvas placement (e.g. an image
/// larger than its region) clips instead of wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectPx {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl RectPx {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn of_canvas(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn intersect(self, other: Self) -> Self {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.w).min(other.x + other.w);
        let y1 = (self.y + self.h).min(other.y + other.h);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Shrink by `margin` on every side.
    pub fn inset(self, margin: i32) -> Self {
        Self::new(
            self.x + margin,
            self.y + margin,
            self.w - 2 * margin,
            self.h - 2 * margin,
        )
    }
}

pub fn premultiply(straight: [u8; 4]) -> PremulRgba8 {
    let a = straight[3];
    [
        mul_div255(straight[0], a),
        mul_div255(straight[1], a),
        mul_div255(straight[2], a),
        a,
    ]
}

/// Source-over for a single premultiplied pixel, with an extra opacity factor.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u8;
    let sa = mul_div255(src[3], op);
    if sa == 0 {
        return dst;
    }
    let inv = 255 - sa;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let sc = mul_div255(src[i], op);
        out[i] = sc.saturating_add(mul_div255(dst[i], inv));
    }
    out
}

/// Linear blend of two premultiplied pixels; `alpha` is the weight of `b`.
pub fn crossfade(a: PremulRgba8, b: PremulRgba8, alpha: f32) -> PremulRgba8 {
    let alpha = alpha.clamp(0.0, 1.0);
    let bw = ((alpha * 255.0).round() as i32).clamp(0, 255) as u8;
    let aw = 255 - bw;

    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = mul_div255(a[i], aw).saturating_add(mul_div255(b[i], bw));
    }
    out
}

/// `dst = crossfade(dst, src, alpha)` over whole equal-sized buffers.
/// Mismatched lengths are a caller bug; the blend silently stops at the
/// shorter buffer rather than panicking mid-frame.
pub fn crossfade_in_place(dst: &mut [u8], src: &[u8], alpha: f32) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = crossfade([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], alpha);
        d.copy_from_slice(&out);
    }
}

/// Opaque rectangle fill, clipped to the buffer.
pub fn fill_rect(data: &mut [u8], width: u32, height: u32, rect: RectPx, color: PremulRgba8) {
    let clipped = rect.intersect(RectPx::of_canvas(width, height));
    if clipped.is_empty() {
        return;
    }
    for y in clipped.y..clipped.y + clipped.h {
        let row = (y as usize) * (width as usize) * 4;
        for x in clipped.x..clipped.x + clipped.w {
            let o = row + (x as usize) * 4;
            data[o..o + 4].copy_from_slice(&color);
        }
    }
}

/// Draw a premultiplied RGBA8 source buffer at `(dst_x, dst_y)`, clipped to
/// both the destination buffer and `clip`, composited with source-over at the
/// given opacity.
#[allow(clippy::too_many_arguments)]
pub fn blit(
    data: &mut [u8],
    width: u32,
    height: u32,
    clip: RectPx,
    src: &[u8],
    src_width: u32,
    src_height: u32,
    dst_x: i32,
    dst_y: i32,
    opacity: f32,
) {
    let src_rect = RectPx::new(dst_x, dst_y, src_width as i32, src_height as i32);
    let clipped = src_rect
        .intersect(clip)
        .intersect(RectPx::of_canvas(width, height));
    if clipped.is_empty() || opacity <= 0.0 {
        return;
    }

    for y in clipped.y..clipped.y + clipped.h {
        let sy = (y - dst_y) as usize;
        let drow = (y as usize) * (width as usize) * 4;
        let srow = sy * (src_width as usize) * 4;
        for x in clipped.x..clipped.x + clipped.w {
            let sx = (x - dst_x) as usize;
            let so = srow + sx * 4;
            let d = drow + (x as usize) * 4;
            let px = over(
                [data[d], data[d + 1], data[d + 2], data[d + 3]],
                [src[so], src[so + 1], src[so + 2], src[so + 3]],
                opacity,
            );
            data[d..d + 4].copy_from_slice(&px);
        }
    }
}

fn mul_div255(x: u8, y: u8) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

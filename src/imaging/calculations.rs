//! Pure dimension math. No I/O.

/// Scale `source` to the largest size that fits inside `bounds`, keeping the
/// aspect ratio.
///
/// Matches ImageMagick's plain `-resize WxH`: images smaller than the box are
/// scaled up as well. Neither edge is ever rounded down to zero.
///
/// ```
/// # use post_press::imaging::fit_within;
/// assert_eq!(fit_within((4032, 3024), (1024, 1024)), (1024, 768));
/// assert_eq!(fit_within((3024, 4032), (1024, 1024)), (768, 1024));
/// ```
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;
    if src_w == 0 || src_h == 0 {
        return (0, 0);
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

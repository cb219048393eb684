use kiss3d::renderer::LineRenderer;

use nalgebra::Point3;

pub fn draw_path<I: Iterator<Item = Point3<f32>>>(
    line_renderer: &mut LineRenderer,
    points: I,
    color: &Point3<f32>,
) {
    let mut prev_pt = None;
    for pt in points {
        if let Some(prev_pt) = prev_pt {
            line_renderer.draw_line(prev_pt, pt, *color);
        }
        prev_pt = Some(pt);
    }
}

/// Like [draw_path], but also joins the last point back to the first.
pub fn draw_loop(line_renderer: &mut LineRenderer, points: &[Point3<f32>], color: &Point3<f32>) {
    let closing = points.first().copied();
    draw_path(line_renderer, points.iter().copied().chain(closing), color);
}

use glam::DVec2;

use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a thicker line (highlighted zone outline)
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    draw_line(canvas, x0, y0, x1, y1);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1);
}

/// Draw an axis-aligned rectangle outline with a dotted stroke
pub fn draw_dotted_rect(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let (left, right) = (x0.min(x1), x0.max(x1));
    let (top, bottom) = (y0.min(y1), y0.max(y1));
    let max_x = canvas.pixel_width() as i32;
    let max_y = canvas.pixel_height() as i32;

    for x in (left.max(0)..=right.min(max_x)).step_by(2) {
        canvas.set_pixel_signed(x, top);
        canvas.set_pixel_signed(x, bottom);
    }
    for y in (top.max(0)..=bottom.min(max_y)).step_by(2) {
        canvas.set_pixel_signed(left, y);
        canvas.set_pixel_signed(right, y);
    }
}

/// Scanline fill of projected rings using the even-odd rule, so holes
/// stay empty. Rows are clipped to the canvas.
pub fn fill_rings(canvas: &mut BrailleCanvas, rings: &[Vec<(i32, i32)>]) {
    let Some((min_y, max_y)) = rings
        .iter()
        .flatten()
        .map(|&(_, y)| (y, y))
        .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))
    else {
        return;
    };

    let top = min_y.max(0);
    let bottom = max_y.min(canvas.pixel_height() as i32 - 1);
    let right_edge = canvas.pixel_width() as i32 - 1;
    let mut crossings: Vec<f64> = Vec::new();

    for y in top..=bottom {
        let scan = y as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            let mut j = ring.len() - 1;
            for i in 0..ring.len() {
                let (xi, yi) = (ring[i].0 as f64, ring[i].1 as f64);
                let (xj, yj) = (ring[j].0 as f64, ring[j].1 as f64);
                if (yi > scan) != (yj > scan) {
                    crossings.push(xi + (scan - yi) * (xj - xi) / (yj - yi));
                }
                j = i;
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));
        for span in crossings.chunks_exact(2) {
            let start = (span[0].ceil() as i32).max(0);
            let end = (span[1].floor() as i32).min(right_edge);
            for x in start..=end {
                canvas.set_pixel(x as usize, y as usize);
            }
        }
    }
}

/// Even-odd ray casting against a single ring
pub fn point_in_ring(point: DVec2, ring: &[DVec2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Polygon containment: inside the exterior ring (first) and outside every hole
pub fn point_in_polygon(point: DVec2, rings: &[Vec<DVec2>]) -> bool {
    match rings.split_first() {
        Some((exterior, holes)) => {
            point_in_ring(point, exterior) && !holes.iter().any(|h| point_in_ring(point, h))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(x0, y0),
            DVec2::new(x0 + size, y0),
            DVec2::new(x0 + size, y0 + size),
            DVec2::new(x0, y0 + size),
            DVec2::new(x0, y0),
        ]
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert!((0..10).all(|x| canvas.is_set(x, 0)));
        assert!(!canvas.is_set(0, 1));
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert!((0..8).all(|y| canvas.is_set(0, y)));
    }

    #[test]
    fn test_fill_square() {
        let mut canvas = BrailleCanvas::new(10, 5);
        let ring = vec![(2, 2), (12, 2), (12, 12), (2, 12)];
        fill_rings(&mut canvas, &[ring]);
        assert!(canvas.is_set(7, 7));
        assert!(!canvas.is_set(0, 0));
        assert!(!canvas.is_set(15, 7));
    }

    #[test]
    fn test_fill_leaves_hole_empty() {
        let mut canvas = BrailleCanvas::new(20, 10);
        let outer = vec![(0, 0), (30, 0), (30, 30), (0, 30)];
        let hole = vec![(10, 10), (20, 10), (20, 20), (10, 20)];
        fill_rings(&mut canvas, &[outer, hole]);
        assert!(canvas.is_set(5, 5));
        assert!(!canvas.is_set(15, 15));
    }

    #[test]
    fn test_point_in_polygon_with_hole() {
        let rings = vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)];
        assert!(point_in_polygon(DVec2::new(1.0, 1.0), &rings));
        assert!(!point_in_polygon(DVec2::new(5.0, 5.0), &rings));
        assert!(!point_in_polygon(DVec2::new(11.0, 5.0), &rings));
        assert!(!point_in_polygon(DVec2::new(1.0, 1.0), &[]));
    }
}

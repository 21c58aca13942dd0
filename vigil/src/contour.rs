//! # Contour extraction
//!
//! Finds connected foreground components in a cleaned-up mask and reports
//! each one's external boundary, geometric area and bounding box. Holes
//! inside a component are not reported as separate contours.

use crate::frame::Rect;
use crate::mask::ForegroundMask;
use nalgebra as na;

/// Neighbour offsets in clockwise order (image coordinates, y down),
/// starting east.
const DIRS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// External boundary of one connected foreground component.
#[derive(Clone, Debug)]
pub struct Contour {
    /// Boundary points in trace order, compressed to direction changes only.
    pub points: Vec<na::Point2<i64>>,
    /// Geometric (polygon) area enclosed by the boundary. Zero for
    /// boundaries of fewer than three points.
    pub area: f64,
    /// Minimal axis-aligned rectangle containing all boundary points,
    /// inclusive of the boundary pixels themselves.
    pub bounding_box: Rect,
}

/// Extract the external contour of every connected foreground component.
///
/// Components are discovered by 8-connected flood fill, then each one's
/// boundary is traced from its raster-first pixel. `labels` and `contours`
/// are reusable buffers; both are cleared first. An empty mask simply yields
/// no contours.
pub fn find_contours(mask: &ForegroundMask, labels: &mut Vec<u32>, contours: &mut Vec<Contour>) {
    contours.clear();

    let (w, h) = mask.dim();
    labels.clear();
    labels.resize(w * h, 0);

    let mut next_label = 0u32;

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            if mask.data()[idx] == 0 || labels[idx] != 0 {
                continue;
            }

            // Raster-first pixel of an unseen component. Label the whole
            // component so holes and later rows cannot restart it.
            next_label += 1;
            fill_component(mask, labels, (x, y), next_label);

            let boundary = trace_boundary(mask, (x as i64, y as i64));
            let points = compress(&boundary);

            let min_x = points.iter().map(|p| p.0).min().unwrap_or(0);
            let max_x = points.iter().map(|p| p.0).max().unwrap_or(0);
            let min_y = points.iter().map(|p| p.1).min().unwrap_or(0);
            let max_y = points.iter().map(|p| p.1).max().unwrap_or(0);

            contours.push(Contour {
                area: polygon_area(&points),
                bounding_box: Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1),
                points: points
                    .into_iter()
                    .map(|(x, y)| na::Point2::new(x, y))
                    .collect(),
            });
        }
    }
}

/// Mark every pixel 8-connected to `start` with `label`.
fn fill_component(mask: &ForegroundMask, labels: &mut [u32], start: (usize, usize), label: u32) {
    let (w, h) = mask.dim();
    labels[start.1 * w + start.0] = label;
    let mut to_fill = vec![start];

    while let Some((x, y)) = to_fill.pop() {
        for (dx, dy) in DIRS {
            let (nx, ny) = (x as i64 + dx, y as i64 + dy);
            if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                continue;
            }
            let nidx = ny as usize * w + nx as usize;
            if mask.data()[nidx] != 0 && labels[nidx] == 0 {
                labels[nidx] = label;
                to_fill.push((nx as usize, ny as usize));
            }
        }
    }
}

/// Moore-neighbour boundary trace starting at a component's raster-first
/// pixel, whose west neighbour is guaranteed off.
fn trace_boundary(mask: &ForegroundMask, start: (i64, i64)) -> Vec<(i64, i64)> {
    let (w, h) = mask.dim();
    let mut boundary = vec![start];

    let mut current = start;
    let mut backtrack = (start.0 - 1, start.1);
    let mut second = None;

    // Each boundary pixel is visited a bounded number of times, so this caps
    // the trace for any mask contents.
    for _ in 0..8 * w * h + 8 {
        let bi = DIRS
            .iter()
            .position(|&(dx, dy)| (current.0 + dx, current.1 + dy) == backtrack)
            .unwrap_or(4);

        // Scan clockwise from just past the backtrack point for the next
        // on-pixel; every off-pixel passed becomes the new backtrack.
        let mut next = None;
        for k in 1..=8 {
            let (dx, dy) = DIRS[(bi + k) % 8];
            let n = (current.0 + dx, current.1 + dy);
            if mask.is_on(n.0, n.1) {
                next = Some(n);
                break;
            }
            backtrack = n;
        }

        let next = match next {
            Some(n) => n,
            // Isolated pixel.
            None => break,
        };

        match second {
            None => second = Some(next),
            // Jacob's stopping criterion: back at the start pixel, about to
            // retrace the first move.
            Some(s) if current == start && next == s => break,
            Some(_) => {}
        }

        boundary.push(next);
        current = next;
    }

    // The closing revisit of the start pixel is not part of the chain.
    if boundary.len() > 1 && boundary.last() == Some(&start) {
        boundary.pop();
    }

    boundary
}

/// Drop boundary points that continue in the same direction as their
/// predecessor, keeping only direction changes.
fn compress(points: &[(i64, i64)]) -> Vec<(i64, i64)> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let mut out = Vec::new();
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        let d_in = (cur.0 - prev.0, cur.1 - prev.1);
        let d_out = (next.0 - cur.0, next.1 - cur.1);
        if d_in != d_out {
            out.push(cur);
        }
    }

    if out.is_empty() {
        out.push(points[0]);
    }
    out
}

/// Shoelace area of a closed polygon through pixel centres.
fn polygon_area(points: &[(i64, i64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0i64;
    for i in 0..points.len() {
        let (ax, ay) = points[i];
        let (bx, by) = points[(i + 1) % points.len()];
        sum += ax * by - bx * ay;
    }
    sum.abs() as f64 / 2.0
}

//! Line rasterization and lateral routes

use crate::core::types::Cell;

/// Cells on the Bresenham line from `start` to `end`, both inclusive
pub fn points_on_line(start: Cell, end: Cell) -> Vec<Cell> {
    let (mut x0, mut z0) = (start.x, start.z);
    let (x1, z1) = (end.x, end.z);
    let dx = (x1 - x0).abs();
    let dz = (z1 - z0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sz = if z0 < z1 { 1 } else { -1 };
    let mut err = dx - dz;

    let mut cells = Vec::with_capacity((dx.max(dz) + 1) as usize);
    loop {
        cells.push(Cell::new(x0, z0));
        if x0 == x1 && z0 == z1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dz {
            err -= dz;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            z0 += sz;
        }
    }
    cells
}

/// Lateral route from `start` to `end` with a sideways jog of `offset` cells
///
/// Offset 0 is the straight line. Otherwise the route runs to
/// `start + (offset, 0)` first and then on to the end; the joint cell
/// appears twice, the same way two joined rasterized segments do.
pub fn lateral_route(start: Cell, end: Cell, offset: i32) -> Vec<Cell> {
    if offset == 0 {
        return points_on_line(start, end);
    }

    let mid = Cell::new(start.x + offset, start.z);
    let mut cells = points_on_line(start, mid);
    cells.extend(points_on_line(mid, end));
    cells
}

/// Whether `b` and `c` lie on (roughly) the same line through `a`
///
/// Compares slopes of a→b and a→c; vertical segments have infinite slope.
pub fn points_collinear(a: Cell, b: Cell, c: Cell, tolerance: f32) -> bool {
    if b.x == a.x && c.x == a.x {
        return true;
    }
    let slope = |p: Cell| {
        if p.x == a.x {
            f32::INFINITY
        } else {
            (p.z - a.z) as f32 / (p.x - a.x) as f32
        }
    };
    let difference = (slope(b) - slope(c)).abs();
    difference < tolerance
}

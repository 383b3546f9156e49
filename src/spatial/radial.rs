//! Radial cell enumeration (nearest first) and fixed neighborhoods

use crate::core::types::Cell;

/// Offsets within `radius` of the origin, ordered by distance
///
/// Ties at equal distance keep a fixed (x, z) order so every caller sees the
/// same enumeration.
pub fn radial_offsets(radius: f32) -> Vec<Cell> {
    if radius.is_nan() || radius < 0.0 {
        return Vec::new();
    }

    let reach = radius.floor() as i32;
    let limit = radius * radius;
    let mut offsets = Vec::new();
    for x in -reach..=reach {
        for z in -reach..=reach {
            let d2 = (x * x + z * z) as f32;
            if d2 <= limit {
                offsets.push(Cell::new(x, z));
            }
        }
    }
    offsets.sort_by_key(|c| (c.x * c.x + c.z * c.z, c.x, c.z));
    offsets
}

/// Cells around `center` within `radius`, center first
pub fn cells_in_radius(center: Cell, radius: f32) -> Vec<Cell> {
    radial_offsets(radius)
        .into_iter()
        .map(|offset| center + offset)
        .collect()
}

/// Number of cells within `radius` (center included)
pub fn num_cells_in_radius(radius: f32) -> usize {
    radial_offsets(radius).len()
}

/// Square neighborhood of half-width `half` around `center` (3x3 for 1)
pub fn square_neighborhood(center: Cell, half: i32) -> impl Iterator<Item = Cell> {
    (-half..=half).flat_map(move |dx| (-half..=half).map(move |dz| Cell::new(center.x + dx, center.z + dz)))
}

/// The eight cells touching `center`
pub fn adjacent_8(center: Cell) -> [Cell; 8] {
    [
        Cell::new(center.x - 1, center.z - 1),
        Cell::new(center.x, center.z - 1),
        Cell::new(center.x + 1, center.z - 1),
        Cell::new(center.x - 1, center.z),
        Cell::new(center.x + 1, center.z),
        Cell::new(center.x - 1, center.z + 1),
        Cell::new(center.x, center.z + 1),
        Cell::new(center.x + 1, center.z + 1),
    ]
}

//! Grid geometry: rasterized lines, lateral routes and radial patterns

pub mod line;
pub mod radial;

pub use line::{lateral_route, points_collinear, points_on_line};
pub use radial::{adjacent_8, cells_in_radius, num_cells_in_radius, radial_offsets, square_neighborhood};

/// Game-state model: what the server sends and how it maps onto the track grid.

pub mod grid;
pub mod snapshot;

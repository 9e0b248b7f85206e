pub mod states;
pub mod params;
pub mod distance;
pub mod forces;
pub mod attraction;
pub mod spatial_grid;
pub mod integrator;
pub mod generator;
pub mod engine;
pub mod scenario;

pub mod models;
pub mod normalize;
pub mod region;

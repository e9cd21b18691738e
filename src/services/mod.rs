pub mod sessions;
pub mod trips;

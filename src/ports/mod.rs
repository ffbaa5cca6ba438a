pub mod snapshot;
pub mod spotify;

pub mod spotify;
pub mod sync;

pub mod common;
pub mod lookup;
pub mod map;

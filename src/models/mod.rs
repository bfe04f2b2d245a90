mod map;
mod point;

pub use map::*;
pub use point::*;

pub mod palette;
pub mod replay;

pub use palette::{palette, PaletteArgs};
pub use replay::{replay, ReplayArgs};

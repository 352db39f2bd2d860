//! # procflow palette
//!
//! Palette entries for creating process elements and activating tools.
//!
//! ```rust,ignore
//! use procflow_palette::PaletteProvider;
//!
//! let palette = PaletteProvider::new();
//! let outcome = palette.trigger("create.subprocess-expanded", &mut session, Point::new(100.0, 100.0))?;
//! ```

mod provider;
mod translate;

pub use provider::{
    PaletteAction, PaletteEntry, PaletteError, PaletteOutcome, PaletteProvider, Tool,
    SUBPROCESS_START_OFFSET,
};
pub use translate::{substitute, DefaultTranslator, Translator};

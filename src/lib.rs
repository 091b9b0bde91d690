mod shapes;
pub mod error;
#[cfg(feature = "background-remover")]
mod background_remover;

pub use crate::shapes::{ShapeRecord, extract_shapes, to_json, to_pairs, write_json, write_pairs};
#[cfg(feature = "background-remover")]
pub use crate::background_remover::BackgroundRemover;

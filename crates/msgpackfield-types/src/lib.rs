pub mod error;
pub mod input;
pub mod value;

pub use error::{Error, Result};
pub use input::{InputKind, RawInput};
pub use value::{MapBuilder, Value, float_repr};

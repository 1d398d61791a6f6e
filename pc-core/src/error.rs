//! Error types re-exported from the pc-error crate.

pub use pc_error::{PicontrolError, Result};

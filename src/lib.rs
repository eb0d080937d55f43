pub mod keygen;

pub use crate::keygen::*;

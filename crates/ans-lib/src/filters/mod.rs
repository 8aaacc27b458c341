pub mod design;
pub mod fir;

pub use design::*;
pub use fir::*;

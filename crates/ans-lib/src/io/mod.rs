pub mod prepare;
pub mod session;
pub mod text;

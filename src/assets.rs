pub mod lifecycle;
pub mod preview;

pub mod dashboard;
pub mod input;
pub mod theme;

pub use theme::styles;

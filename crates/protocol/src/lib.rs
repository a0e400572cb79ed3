pub mod commands;
pub mod theme;
pub mod types;
pub mod units;

pub use commands::{RenderCommand, TextAlign};
pub use theme::ThemeToken;
pub use types::{Point, Rect};
pub use units::ValueUnit;

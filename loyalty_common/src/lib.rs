mod points;

pub mod helpers;
pub mod op;
mod secret;

pub use helpers::is_valid_order_number;
pub use points::{Points, PointsConversionError, POINTS_SCALE};
pub use secret::Secret;

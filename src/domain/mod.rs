pub mod street_light;

pub use street_light::{CoordinateError, Coordinates, SkipReason, SourceRow, StreetLight};

//! Common types shared across the field map crates.

pub mod bbox;
pub mod coordinate;
pub mod crs;
pub mod error;
pub mod event;
pub mod field;
pub mod measurement;
pub mod metadata;
pub mod profile;
pub mod season;

pub use bbox::BoundingBox;
pub use coordinate::{deparse_coordinates, parse_coordinates, Coordinate, Coordinates};
pub use crs::{CrsCode, ProjectionRegistry};
pub use error::{FieldMapError, FieldMapResult};
pub use event::{EntityKind, ServerEvent};
pub use field::{Field, FieldId, FieldOption, FieldRegistration};
pub use measurement::{parse_all, Measurement, MeasurementId, MeasurementValues, Subfield, SubfieldId};
pub use metadata::Metadata;
pub use profile::UserProfile;
pub use season::{Season, SeasonId, SeasonOption};

pub mod calibration;
pub mod dataset;
pub mod error;
pub mod library;
pub mod schema;

pub use calibration::{Calibration, ImportReport};
pub use dataset::{ChannelKind, ChannelSample, Dataset, DatasetId, DatasetPayload};
pub use error::{CalibrationError, DatasetError};
pub use schema::{Edge, SkeletonSchema, ValidationReport};

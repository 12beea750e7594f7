pub mod customization;
pub mod cv;
pub mod dates;
pub mod patch;

use thiserror::Error;

pub use cv::CvAggregate;

/// Rejections raised while parsing or merging CV data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid date '{0}': expected YYYY-MM")]
    InvalidDate(String),

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: String, end: String },

    #[error("invalid colour '{0}': expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    #[error("invalid photo: {0}")]
    InvalidPhoto(String),

    #[error("duplicate {collection} id {id}")]
    DuplicateId { collection: &'static str, id: String },
}

// src/models/student.rs

use serde::Deserialize;
use validator::Validate;

/// DTO for replacing the student's subject interests.
///
/// Unknown subject ids are silently dropped by the insert; the interest set
/// simply ends up containing the valid ones.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInterestsRequest {
    #[validate(length(max = 100, message = "Too many interests."))]
    pub subject_ids: Vec<i64>,
}

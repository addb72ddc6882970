use serde::{Deserialize, Serialize};
use validator::Validate;
use chrono::Utc;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CvEntry {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "cvFileName")]
    pub stored_file_name: String,
    pub original_file_name: String,
    #[serde(rename = "uploadDate")]
    pub submitted_at: chrono::DateTime<Utc>,
}

/// Text fields of a submission, before a file is bound to them.
#[derive(Deserialize, Validate, Debug, Default, Clone)]
pub struct NewCv {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub phone: String,
}

impl NewCv {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        NewCv {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

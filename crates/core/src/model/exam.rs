use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ExamId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown exam type: {0}")]
pub struct ParseExamTypeError(String);

/// The fixed exam categories offered in the exam flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExamType {
    /// Universitäts-Reife-Test.
    #[serde(rename = "URT")]
    Urt,
    /// Test of Competence.
    #[serde(rename = "TOC")]
    Toc,
}

impl ExamType {
    pub const ALL: [ExamType; 2] = [ExamType::Urt, ExamType::Toc];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            ExamType::Urt => "URT",
            ExamType::Toc => "TOC",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            ExamType::Urt => "Universitäts-Reife-Test",
            ExamType::Toc => "Test of Competence",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ExamType {
    type Err = ParseExamTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "URT" => Ok(ExamType::Urt),
            "TOC" => Ok(ExamType::Toc),
            _ => Err(ParseExamTypeError(s.to_string())),
        }
    }
}

/// Catalog entry for one exam instance. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDescriptor {
    pub id: ExamId,
    pub title: String,
    pub exam_type: ExamType,
    pub year: i32,
}

impl ExamDescriptor {
    #[must_use]
    pub fn new(id: ExamId, title: impl Into<String>, exam_type: ExamType, year: i32) -> Self {
        Self {
            id,
            title: title.into(),
            exam_type,
            year,
        }
    }
}

//! Row types for the survey database

use sqlx::FromRow;

use crate::error::{Error, Result};
use crate::model::{QuestionType, SurveyType};

/// Database representation of a survey
#[derive(Debug, Clone, FromRow)]
pub struct DbSurvey {
    pub id: String,
    pub title_tr: String,
    pub title_en: String,
    pub r#type: String,
    pub revision: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Database representation of a question
#[derive(Debug, Clone, FromRow)]
pub struct DbQuestion {
    pub id: String,
    pub survey_id: String,
    pub r#type: String,
    pub text_tr: String,
    pub text_en: String,
    pub description_tr: Option<String>,
    pub description_en: Option<String>,
    pub required: bool,
    pub position: i64,
}

/// Database representation of an option
#[derive(Debug, Clone, FromRow)]
pub struct DbOption {
    pub id: String,
    pub question_id: String,
    pub text_tr: String,
    pub text_en: String,
}

/// Database representation of a response
#[derive(Debug, Clone, FromRow)]
pub struct DbResponse {
    pub id: String,
    pub survey_id: String,
    pub customer_info: String, // JSON
    pub language: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Database representation of an answer
#[derive(Debug, Clone, FromRow)]
pub struct DbAnswer {
    pub id: String,
    pub response_id: String,
    pub question_id: String,
    pub value: String,
}

/// Decode a stored survey type, rejecting rows written by a newer schema.
pub fn decode_survey_type(raw: &str) -> Result<SurveyType> {
    SurveyType::parse_str(raw).ok_or_else(|| Error::Storage {
        context: format!("unknown survey type '{raw}' in database"),
        source: sqlx::Error::Decode(format!("unknown survey type '{raw}'").into()),
    })
}

/// Decode a stored question type.
pub fn decode_question_type(raw: &str) -> Result<QuestionType> {
    QuestionType::parse_str(raw).ok_or_else(|| Error::Storage {
        context: format!("unknown question type '{raw}' in database"),
        source: sqlx::Error::Decode(format!("unknown question type '{raw}'").into()),
    })
}

//! SQLite-backed storage for the survey platform
//!
//! This module provides persistent storage for:
//! - Survey definitions (survey → questions → options)
//! - Customer responses and their answers
//!
//! The `Store` facade owns the connection pool; all row-level work lives in
//! the `repository` modules.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;

pub mod db;
pub mod models;
pub mod migrations;
pub mod repository;

use crate::error::Result;
use crate::model::{
    CustomerInfo, Language, QuestionSnapshot, ResponseRecord, SurveyRecord, SurveySnapshot,
    SurveySummary,
};

/// Storage manager using an SQLite backend
pub struct Store {
    pool: sqlx::SqlitePool,
    db_path: PathBuf,
}

impl Store {
    /// Get the path to the SQLite database file
    pub fn default_db_path() -> anyhow::Result<PathBuf> {
        if let Ok(path) = std::env::var("ANKET_DB") {
            return Ok(PathBuf::from(path));
        }

        let data_dir = if cfg!(target_os = "linux") {
            // Use XDG data directory on Linux
            dirs::data_dir()
                .context("Failed to get XDG data directory")?
                .join("anket")
        } else {
            // Use home directory with dot prefix on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".anket")
        };

        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
            log::info!("Created data directory: {:?}", data_dir);
        }

        Ok(data_dir.join("anket.db"))
    }

    /// Open the store at the default location and run migrations
    pub async fn open_default() -> anyhow::Result<Self> {
        let db_path = Self::default_db_path()?;
        Self::open(db_path).await
    }

    /// Open the store at a specific path and run migrations
    pub async fn open(db_path: PathBuf) -> anyhow::Result<Self> {
        log::debug!("Opening survey store at: {:?}", db_path);

        let pool = db::connect(&db_path).await?;
        db::run_migrations(&pool).await?;

        Ok(Self { pool, db_path })
    }

    /// Create a store for testing (in-memory database)
    pub async fn new_test() -> anyhow::Result<Self> {
        let pool = db::connect_memory().await?;
        db::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            db_path: PathBuf::from(":memory:"),
        })
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.pool
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    // Survey definition methods
    pub async fn insert_survey_tree(&self, snapshot: &SurveySnapshot) -> Result<String> {
        repository::surveys::insert_tree(&self.pool, snapshot).await
    }

    pub async fn get_survey(&self, survey_id: &str) -> Result<Option<SurveyRecord>> {
        repository::surveys::get(&self.pool, survey_id).await
    }

    pub async fn fetch_questions(&self, survey_id: &str) -> Result<Vec<QuestionSnapshot>> {
        repository::surveys::fetch_questions(&self.pool, survey_id).await
    }

    pub async fn list_surveys(&self) -> Result<Vec<SurveySummary>> {
        repository::surveys::list(&self.pool).await
    }

    pub async fn survey_exists(&self, survey_id: &str) -> Result<bool> {
        repository::surveys::exists(&self.pool, survey_id).await
    }

    pub async fn delete_survey(&self, survey_id: &str) -> Result<()> {
        repository::surveys::delete(&self.pool, survey_id).await
    }

    // Response methods
    pub async fn insert_response(
        &self,
        survey_id: &str,
        customer_info: &CustomerInfo,
        language: Language,
        answers: &BTreeMap<String, String>,
    ) -> Result<String> {
        repository::responses::insert(&self.pool, survey_id, customer_info, language, answers).await
    }

    pub async fn list_responses(&self, survey_id: &str) -> Result<Vec<ResponseRecord>> {
        repository::responses::list_for_survey(&self.pool, survey_id).await
    }

    pub async fn delete_response(&self, response_id: &str) -> Result<()> {
        repository::responses::delete(&self.pool, response_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeRef, OptionSnapshot, QuestionType, SurveyType};

    fn sample_snapshot() -> SurveySnapshot {
        SurveySnapshot {
            title_tr: "Müşteri Memnuniyet Anketi".into(),
            title_en: "Customer Satisfaction Survey".into(),
            survey_type: SurveyType::Satisfaction,
            revision: None,
            questions: vec![
                QuestionSnapshot {
                    ident: NodeRef::New,
                    question_type: QuestionType::Rate,
                    text_tr: "Memnuniyetiniz?".into(),
                    text_en: "How satisfied are you?".into(),
                    description_tr: Some("1-5".into()),
                    description_en: Some("1-5".into()),
                    required: true,
                    order: 1,
                    options: vec![],
                },
                QuestionSnapshot {
                    ident: NodeRef::New,
                    question_type: QuestionType::Choice,
                    text_tr: "Tavsiye eder misiniz?".into(),
                    text_en: "Would you recommend us?".into(),
                    description_tr: None,
                    description_en: None,
                    required: true,
                    order: 2,
                    options: vec![
                        OptionSnapshot {
                            ident: NodeRef::New,
                            text_tr: "Evet".into(),
                            text_en: "Yes".into(),
                        },
                        OptionSnapshot {
                            ident: NodeRef::New,
                            text_tr: "Hayır".into(),
                            text_en: "No".into(),
                        },
                    ],
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let store = Store::new_test().await.unwrap();
        let id = store.insert_survey_tree(&sample_snapshot()).await.unwrap();

        let record = store.get_survey(&id).await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.snapshot.title_en, "Customer Satisfaction Survey");
        assert_eq!(record.snapshot.questions.len(), 2);

        let choice = &record.snapshot.questions[1];
        assert_eq!(choice.question_type, QuestionType::Choice);
        assert_eq!(choice.options.len(), 2);
        assert!(choice.ident.existing().is_some());
        assert!(choice.options.iter().all(|o| o.ident.existing().is_some()));
    }

    #[tokio::test]
    async fn test_get_missing_survey_returns_none() {
        let store = Store::new_test().await.unwrap();
        assert!(store.get_survey("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_counts_questions_and_responses() {
        let store = Store::new_test().await.unwrap();
        let id = store.insert_survey_tree(&sample_snapshot()).await.unwrap();

        let summaries = store.list_surveys().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, id);
        assert_eq!(summaries[0].question_count, 2);
        assert_eq!(summaries[0].response_count, 0);
    }

    #[tokio::test]
    async fn test_delete_survey_cascades() {
        let store = Store::new_test().await.unwrap();
        let id = store.insert_survey_tree(&sample_snapshot()).await.unwrap();

        let questions = store.fetch_questions(&id).await.unwrap();
        let rate_id = questions[0].ident.existing().unwrap().to_string();

        let customer = CustomerInfo {
            full_name: "Ayşe Yılmaz".into(),
            email: "ayse@example.com".into(),
            phone: "+90 555 000 00 00".into(),
            company_name: "Acme".into(),
            country: None,
            address: None,
        };
        let mut answers = BTreeMap::new();
        answers.insert(rate_id, "5".to_string());
        store
            .insert_response(&id, &customer, Language::Tr, &answers)
            .await
            .unwrap();

        store.delete_survey(&id).await.unwrap();

        assert!(store.get_survey(&id).await.unwrap().is_none());
        let leftover: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(leftover, 0);
        let leftover: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM options")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_survey_not_found() {
        let store = Store::new_test().await.unwrap();
        let err = store.delete_survey("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_response_round_trip_and_delete() {
        let store = Store::new_test().await.unwrap();
        let id = store.insert_survey_tree(&sample_snapshot()).await.unwrap();
        let questions = store.fetch_questions(&id).await.unwrap();
        let rate_id = questions[0].ident.existing().unwrap().to_string();

        let customer = CustomerInfo {
            full_name: "Mehmet Demir".into(),
            email: String::new(),
            phone: "+90 555 111 11 11".into(),
            company_name: "Demir Ltd".into(),
            country: Some("TR".into()),
            address: None,
        };
        let mut answers = BTreeMap::new();
        answers.insert(rate_id.clone(), "4".to_string());
        let response_id = store
            .insert_response(&id, &customer, Language::En, &answers)
            .await
            .unwrap();

        let responses = store.list_responses(&id).await.unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, response_id);
        assert_eq!(responses[0].language, Language::En);
        assert_eq!(responses[0].customer_info.full_name, "Mehmet Demir");
        assert_eq!(responses[0].answers.len(), 1);
        assert_eq!(responses[0].answers[0].question_id, rate_id);
        assert_eq!(responses[0].answers[0].value, "4");

        store.delete_response(&response_id).await.unwrap();
        assert!(store.list_responses(&id).await.unwrap().is_empty());

        let err = store.delete_response(&response_id).await.unwrap_err();
        assert!(err.is_not_found());
    }
}

//! High-level survey operations
//!
//! `SurveyService` is the surface the authoring and respondent endpoints call:
//! definition CRUD backed by the reconciliation engine, plus validated
//! response submission behind the injected rate-limit gate.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{
    CustomerInfo, Language, RespondentQuestion, RespondentSurvey, ResponseRecord, SurveyRecord,
    SurveySnapshot, SurveySummary,
};
use crate::rate_limit::{KeyedRateLimiter, RateLimitConfig, SubmissionGate};
use crate::reconcile;
use crate::store::Store;
use crate::submission;

pub struct SurveyService {
    store: Store,
    gate: Arc<dyn SubmissionGate>,
}

impl SurveyService {
    pub fn new(store: Store, gate: Arc<dyn SubmissionGate>) -> Self {
        Self { store, gate }
    }

    /// Service with the default per-client submission budget
    pub fn with_default_gate(store: Store) -> Self {
        Self::new(store, Arc::new(KeyedRateLimiter::new(RateLimitConfig::default())))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // Authoring interface

    /// Validate and persist a new survey tree. Identifiers on the snapshot
    /// are ignored; every node is created fresh.
    pub async fn create_survey(&self, snapshot: &SurveySnapshot) -> Result<String> {
        reconcile::validate_snapshot(snapshot)?;
        self.store.insert_survey_tree(snapshot).await
    }

    /// Reconcile the persisted tree with the submitted snapshot.
    pub async fn update_survey(&self, survey_id: &str, snapshot: &SurveySnapshot) -> Result<()> {
        reconcile::apply(self.store.pool(), survey_id, snapshot).await
    }

    pub async fn delete_survey(&self, survey_id: &str) -> Result<()> {
        self.store.delete_survey(survey_id).await
    }

    pub async fn get_survey(&self, survey_id: &str) -> Result<SurveyRecord> {
        self.store
            .get_survey(survey_id)
            .await?
            .ok_or_else(|| Error::not_found("survey", survey_id))
    }

    pub async fn list_surveys(&self) -> Result<Vec<SurveySummary>> {
        self.store.list_surveys().await
    }

    // Respondent interface

    /// Ordered, localized rendering view of a published survey.
    pub async fn load_survey_for_respondent(
        &self,
        survey_id: &str,
        language: Language,
    ) -> Result<RespondentSurvey> {
        let record = self.get_survey(survey_id).await?;

        let questions = record
            .snapshot
            .questions
            .iter()
            .map(|q| RespondentQuestion {
                // Persisted questions always carry identifiers.
                id: q.ident.existing().unwrap_or_default().to_string(),
                question_type: q.question_type,
                text: q.text(language).to_string(),
                description: q.description(language).map(str::to_string),
                required: q.required,
                order: q.order,
                options: q
                    .options
                    .iter()
                    .map(|o| o.text(language).to_string())
                    .collect(),
            })
            .collect();

        Ok(RespondentSurvey {
            id: record.id,
            title: record.snapshot.title(language).to_string(),
            survey_type: record.snapshot.survey_type,
            questions,
        })
    }

    /// Validate and persist one submission. Nothing is stored unless every
    /// check passes; the rate-limit gate is consulted first.
    pub async fn submit_response(
        &self,
        survey_id: &str,
        client: &str,
        customer_info: &CustomerInfo,
        language: Language,
        answers: &BTreeMap<String, String>,
    ) -> Result<String> {
        if !self.gate.admit(client).await {
            log::warn!("Submission from '{}' rejected by rate limiter", client);
            return Err(Error::RateLimited);
        }

        if !self.store.survey_exists(survey_id).await? {
            return Err(Error::not_found("survey", survey_id));
        }

        submission::validate_customer_info(customer_info)?;

        let questions = self.store.fetch_questions(survey_id).await?;
        submission::validate_answers(&questions, language, answers)?;

        self.store
            .insert_response(survey_id, customer_info, language, answers)
            .await
    }

    // Admin review interface

    pub async fn list_responses(&self, survey_id: &str) -> Result<Vec<ResponseRecord>> {
        if !self.store.survey_exists(survey_id).await? {
            return Err(Error::not_found("survey", survey_id));
        }
        self.store.list_responses(survey_id).await
    }

    pub async fn delete_response(&self, response_id: &str) -> Result<()> {
        self.store.delete_response(response_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeRef, OptionSnapshot, QuestionSnapshot, QuestionType, SurveyType};
    use async_trait::async_trait;

    struct ClosedGate;

    #[async_trait]
    impl SubmissionGate for ClosedGate {
        async fn admit(&self, _client: &str) -> bool {
            false
        }
    }

    fn snapshot() -> SurveySnapshot {
        SurveySnapshot {
            title_tr: "Anket".into(),
            title_en: "Survey".into(),
            survey_type: SurveyType::Satisfaction,
            revision: None,
            questions: vec![
                QuestionSnapshot {
                    ident: NodeRef::New,
                    question_type: QuestionType::Rate,
                    text_tr: "Puanınız?".into(),
                    text_en: "Your rating?".into(),
                    description_tr: None,
                    description_en: None,
                    required: true,
                    order: 1,
                    options: vec![],
                },
                QuestionSnapshot {
                    ident: NodeRef::New,
                    question_type: QuestionType::Choice,
                    text_tr: "Teslimat?".into(),
                    text_en: "Delivery?".into(),
                    description_tr: None,
                    description_en: None,
                    required: false,
                    order: 2,
                    options: vec![
                        OptionSnapshot {
                            ident: NodeRef::New,
                            text_tr: "Hızlı".into(),
                            text_en: "Fast".into(),
                        },
                        OptionSnapshot {
                            ident: NodeRef::New,
                            text_tr: "Yavaş".into(),
                            text_en: "Slow".into(),
                        },
                    ],
                },
            ],
        }
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            full_name: "Ali Veli".into(),
            email: "ali@example.com".into(),
            phone: "+90 555 123 45 67".into(),
            company_name: "Veli A.Ş.".into(),
            country: Some("TR".into()),
            address: None,
        }
    }

    async fn open_service() -> SurveyService {
        let store = Store::new_test().await.unwrap();
        SurveyService::new(
            store,
            Arc::new(KeyedRateLimiter::new(RateLimitConfig::disabled())),
        )
    }

    #[tokio::test]
    async fn test_create_survey_rejects_invalid_snapshot() {
        let service = open_service().await;
        let mut bad = snapshot();
        bad.questions[1].options.clear();

        let err = service.create_survey(&bad).await.unwrap_err();
        assert!(err.is_validation());
        assert!(service.list_surveys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_respondent_view_is_localized_and_ordered() {
        let service = open_service().await;
        let id = service.create_survey(&snapshot()).await.unwrap();

        let view = service
            .load_survey_for_respondent(&id, Language::En)
            .await
            .unwrap();
        assert_eq!(view.title, "Survey");
        assert_eq!(view.questions.len(), 2);
        assert_eq!(view.questions[0].text, "Your rating?");
        assert_eq!(view.questions[1].options, vec!["Fast", "Slow"]);

        let view_tr = service
            .load_survey_for_respondent(&id, Language::Tr)
            .await
            .unwrap();
        assert_eq!(view_tr.questions[1].options, vec!["Hızlı", "Yavaş"]);
    }

    #[tokio::test]
    async fn test_submit_response_happy_path() {
        let service = open_service().await;
        let id = service.create_survey(&snapshot()).await.unwrap();
        let view = service
            .load_survey_for_respondent(&id, Language::Tr)
            .await
            .unwrap();

        let mut answers = BTreeMap::new();
        answers.insert(view.questions[0].id.clone(), "5".to_string());
        answers.insert(view.questions[1].id.clone(), "Hızlı".to_string());

        let response_id = service
            .submit_response(&id, "1.2.3.4", &customer(), Language::Tr, &answers)
            .await
            .unwrap();

        let responses = service.list_responses(&id).await.unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, response_id);
        assert_eq!(responses[0].answers.len(), 2);
    }

    #[tokio::test]
    async fn test_submit_missing_required_answer_persists_nothing() {
        let service = open_service().await;
        let id = service.create_survey(&snapshot()).await.unwrap();
        let view = service
            .load_survey_for_respondent(&id, Language::Tr)
            .await
            .unwrap();
        let required_id = view.questions[0].id.clone();

        let err = service
            .submit_response(&id, "1.2.3.4", &customer(), Language::Tr, &BTreeMap::new())
            .await
            .unwrap_err();

        match err {
            Error::Validation { question_id, .. } => {
                assert_eq!(question_id.as_deref(), Some(required_id.as_str()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(service.list_responses(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_to_unknown_survey_is_not_found() {
        let service = open_service().await;
        let err = service
            .submit_response(
                "ghost",
                "1.2.3.4",
                &customer(),
                Language::Tr,
                &BTreeMap::new(),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_submit_rate_limited() {
        let store = Store::new_test().await.unwrap();
        let service = SurveyService::new(store, Arc::new(ClosedGate));
        let id = service.create_survey(&snapshot()).await.unwrap();

        let err = service
            .submit_response(&id, "1.2.3.4", &customer(), Language::Tr, &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimited));
    }

    #[tokio::test]
    async fn test_update_survey_runs_reconciliation() {
        let service = open_service().await;
        let id = service.create_survey(&snapshot()).await.unwrap();

        let mut edited = service.get_survey(&id).await.unwrap().snapshot;
        edited.title_en = "Edited".into();
        service.update_survey(&id, &edited).await.unwrap();

        let record = service.get_survey(&id).await.unwrap();
        assert_eq!(record.snapshot.title_en, "Edited");
    }
}

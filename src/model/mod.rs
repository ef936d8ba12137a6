//! Survey tree model: the editable nested structure exchanged with the editor
//! and the views served to respondents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Survey category, stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurveyType {
    Satisfaction,
    Surveillance,
}

impl SurveyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyType::Satisfaction => "SATISFACTION",
            SurveyType::Surveillance => "SURVEILLANCE",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "SATISFACTION" => Some(SurveyType::Satisfaction),
            "SURVEILLANCE" => Some(SurveyType::Surveillance),
            _ => None,
        }
    }
}

/// Question kind, stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Rate,
    Choice,
    Text,
    YesNo,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Rate => "RATE",
            QuestionType::Choice => "CHOICE",
            QuestionType::Text => "TEXT",
            QuestionType::YesNo => "YES_NO",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "RATE" => Some(QuestionType::Rate),
            "CHOICE" => Some(QuestionType::Choice),
            "TEXT" => Some(QuestionType::Text),
            "YES_NO" => Some(QuestionType::YesNo),
            _ => None,
        }
    }
}

/// UI language of a survey view or submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Tr,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Tr => "tr",
            Language::En => "en",
        }
    }

    /// Unknown values fall back to Turkish, the platform default.
    pub fn parse_str(s: &str) -> Self {
        match s {
            "en" => Language::En,
            _ => Language::Tr,
        }
    }
}

/// Identity of a question or option within a snapshot.
///
/// `Existing` nodes are updated in place during reconciliation; `New` nodes
/// are created with a fresh identifier. On the wire an absent or null `id`
/// means `New`; the editor depends on that convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NodeRef {
    Existing(String),
    #[default]
    New,
}

impl NodeRef {
    pub fn is_new(&self) -> bool {
        matches!(self, NodeRef::New)
    }

    pub fn existing(&self) -> Option<&str> {
        match self {
            NodeRef::Existing(id) => Some(id),
            NodeRef::New => None,
        }
    }
}

impl Serialize for NodeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NodeRef::Existing(id) => serializer.serialize_some(id),
            NodeRef::New => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for NodeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let id = Option::<String>::deserialize(deserializer)?;
        Ok(id.map_or(NodeRef::New, NodeRef::Existing))
    }
}

/// Full nested survey tree as sent by the editor in one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySnapshot {
    #[serde(rename = "titleTR")]
    pub title_tr: String,
    #[serde(rename = "titleEN")]
    pub title_en: String,
    #[serde(rename = "type")]
    pub survey_type: SurveyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub questions: Vec<QuestionSnapshot>,
}

impl SurveySnapshot {
    pub fn title(&self, language: Language) -> &str {
        match language {
            Language::Tr => &self.title_tr,
            Language::En => &self.title_en,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSnapshot {
    #[serde(rename = "id", default, skip_serializing_if = "NodeRef::is_new")]
    pub ident: NodeRef,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(rename = "textTR")]
    pub text_tr: String,
    #[serde(rename = "textEN")]
    pub text_en: String,
    #[serde(rename = "descriptionTR", default, skip_serializing_if = "Option::is_none")]
    pub description_tr: Option<String>,
    #[serde(rename = "descriptionEN", default, skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    pub order: i64,
    #[serde(default)]
    pub options: Vec<OptionSnapshot>,
}

fn default_required() -> bool {
    true
}

impl QuestionSnapshot {
    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::Tr => &self.text_tr,
            Language::En => &self.text_en,
        }
    }

    pub fn description(&self, language: Language) -> Option<&str> {
        match language {
            Language::Tr => self.description_tr.as_deref(),
            Language::En => self.description_en.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSnapshot {
    #[serde(rename = "id", default, skip_serializing_if = "NodeRef::is_new")]
    pub ident: NodeRef,
    #[serde(rename = "textTR")]
    pub text_tr: String,
    #[serde(rename = "textEN")]
    pub text_en: String,
}

impl OptionSnapshot {
    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::Tr => &self.text_tr,
            Language::En => &self.text_en,
        }
    }
}

/// Contact record captured with every submission, stored as a JSON column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    pub phone: String,
    #[serde(rename = "companyName")]
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// One survey row for admin listings.
#[derive(Debug, Clone)]
pub struct SurveySummary {
    pub id: String,
    pub title_tr: String,
    pub title_en: String,
    pub survey_type: SurveyType,
    pub revision: Option<String>,
    pub question_count: i64,
    pub response_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A persisted survey: its identifier plus the full editable tree.
#[derive(Debug, Clone)]
pub struct SurveyRecord {
    pub id: String,
    pub snapshot: SurveySnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Localized, ordered rendering view for the public survey page.
#[derive(Debug, Clone, Serialize)]
pub struct RespondentSurvey {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub survey_type: SurveyType,
    pub questions: Vec<RespondentQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RespondentQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub order: i64,
    pub options: Vec<String>,
}

/// One stored answer, as returned to the admin review surface.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub value: String,
}

/// One stored response with its answers.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseRecord {
    pub id: String,
    pub survey_id: String,
    pub customer_info: CustomerInfo,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub answers: Vec<AnswerRecord>,
}

/// Editor-side wrapper around a snapshot that keeps the question order values
/// contiguous (1..N) across edits. Local state only, no storage access.
#[derive(Debug, Clone)]
pub struct SurveyDraft {
    snapshot: SurveySnapshot,
}

impl SurveyDraft {
    pub fn from_snapshot(mut snapshot: SurveySnapshot) -> Self {
        snapshot.questions.sort_by_key(|q| q.order);
        let mut draft = Self { snapshot };
        draft.renumber();
        draft
    }

    pub fn snapshot(&self) -> &SurveySnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> SurveySnapshot {
        self.snapshot
    }

    /// Append a blank question of the given type with the next order value.
    pub fn add_question(&mut self, question_type: QuestionType) -> &mut QuestionSnapshot {
        let order = self.snapshot.questions.len() as i64 + 1;
        self.snapshot.questions.push(QuestionSnapshot {
            ident: NodeRef::New,
            question_type,
            text_tr: String::new(),
            text_en: String::new(),
            description_tr: None,
            description_en: None,
            required: true,
            order,
            options: Vec::new(),
        });
        self.snapshot.questions.last_mut().unwrap()
    }

    pub fn remove_question(&mut self, index: usize) -> Result<QuestionSnapshot> {
        if index >= self.snapshot.questions.len() {
            return Err(Error::validation(format!("no question at index {index}")));
        }
        let removed = self.snapshot.questions.remove(index);
        self.renumber();
        Ok(removed)
    }

    pub fn move_question(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.snapshot.questions.len();
        if from >= len || to >= len {
            return Err(Error::validation(format!(
                "cannot move question {from} -> {to} in a survey with {len} questions"
            )));
        }
        let question = self.snapshot.questions.remove(from);
        self.snapshot.questions.insert(to, question);
        self.renumber();
        Ok(())
    }

    pub fn add_option(&mut self, question: usize, text_tr: String, text_en: String) -> Result<()> {
        let q = self.choice_question_mut(question)?;
        q.options.push(OptionSnapshot {
            ident: NodeRef::New,
            text_tr,
            text_en,
        });
        Ok(())
    }

    pub fn remove_option(&mut self, question: usize, option: usize) -> Result<OptionSnapshot> {
        let q = self.choice_question_mut(question)?;
        if option >= q.options.len() {
            return Err(Error::validation(format!("no option at index {option}")));
        }
        Ok(q.options.remove(option))
    }

    pub fn update_option(
        &mut self,
        question: usize,
        option: usize,
        text_tr: String,
        text_en: String,
    ) -> Result<()> {
        let q = self.choice_question_mut(question)?;
        let opt = q
            .options
            .get_mut(option)
            .ok_or_else(|| Error::validation(format!("no option at index {option}")))?;
        opt.text_tr = text_tr;
        opt.text_en = text_en;
        Ok(())
    }

    fn choice_question_mut(&mut self, index: usize) -> Result<&mut QuestionSnapshot> {
        let q = self
            .snapshot
            .questions
            .get_mut(index)
            .ok_or_else(|| Error::validation(format!("no question at index {index}")))?;
        if q.question_type != QuestionType::Choice {
            return Err(Error::validation(
                "options are only valid on CHOICE questions",
            ));
        }
        Ok(q)
    }

    fn renumber(&mut self) {
        for (i, q) in self.snapshot.questions.iter_mut().enumerate() {
            q.order = i as i64 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_snapshot() -> SurveySnapshot {
        SurveySnapshot {
            title_tr: "Anket".into(),
            title_en: "Survey".into(),
            survey_type: SurveyType::Satisfaction,
            revision: None,
            questions: Vec::new(),
        }
    }

    #[test]
    fn test_node_ref_deserializes_missing_id_as_new() {
        let json = r#"{
            "type": "RATE",
            "textTR": "Puan",
            "textEN": "Rate",
            "required": true,
            "order": 1
        }"#;
        let q: QuestionSnapshot = serde_json::from_str(json).unwrap();
        assert!(q.ident.is_new());
        assert!(q.options.is_empty());
    }

    #[test]
    fn test_node_ref_deserializes_null_id_as_new() {
        let json = r#"{"id": null, "textTR": "A", "textEN": "A"}"#;
        let o: OptionSnapshot = serde_json::from_str(json).unwrap();
        assert!(o.ident.is_new());
    }

    #[test]
    fn test_node_ref_roundtrips_existing_id() {
        let json = r#"{"id": "opt-1", "textTR": "Evet", "textEN": "Yes"}"#;
        let o: OptionSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(o.ident.existing(), Some("opt-1"));

        let back = serde_json::to_string(&o).unwrap();
        assert!(back.contains(r#""id":"opt-1""#));
    }

    #[test]
    fn test_new_node_serializes_without_id_field() {
        let o = OptionSnapshot {
            ident: NodeRef::New,
            text_tr: "Evet".into(),
            text_en: "Yes".into(),
        };
        let json = serde_json::to_string(&o).unwrap();
        assert!(!json.contains("id"));
    }

    #[test]
    fn test_required_defaults_to_true() {
        let json = r#"{"type": "TEXT", "textTR": "T", "textEN": "T", "order": 1}"#;
        let q: QuestionSnapshot = serde_json::from_str(json).unwrap();
        assert!(q.required);
    }

    #[test]
    fn test_draft_add_remove_renumbers() {
        let mut draft = SurveyDraft::from_snapshot(empty_snapshot());
        draft.add_question(QuestionType::Rate);
        draft.add_question(QuestionType::Text);
        draft.add_question(QuestionType::YesNo);
        assert_eq!(
            draft.snapshot().questions.iter().map(|q| q.order).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        draft.remove_question(0).unwrap();
        let orders: Vec<i64> = draft.snapshot().questions.iter().map(|q| q.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(draft.snapshot().questions[0].question_type, QuestionType::Text);
    }

    #[test]
    fn test_draft_move_question_renumbers() {
        let mut draft = SurveyDraft::from_snapshot(empty_snapshot());
        draft.add_question(QuestionType::Rate);
        draft.add_question(QuestionType::Text);
        draft.move_question(1, 0).unwrap();
        assert_eq!(draft.snapshot().questions[0].question_type, QuestionType::Text);
        assert_eq!(draft.snapshot().questions[0].order, 1);
        assert_eq!(draft.snapshot().questions[1].order, 2);
    }

    #[test]
    fn test_draft_options_rejected_on_non_choice() {
        let mut draft = SurveyDraft::from_snapshot(empty_snapshot());
        draft.add_question(QuestionType::Text);
        let err = draft.add_option(0, "Evet".into(), "Yes".into()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_draft_options_on_choice() {
        let mut draft = SurveyDraft::from_snapshot(empty_snapshot());
        draft.add_question(QuestionType::Choice);
        draft.add_option(0, "Evet".into(), "Yes".into()).unwrap();
        draft.add_option(0, "Hayır".into(), "No".into()).unwrap();
        draft.update_option(0, 1, "Hayır".into(), "Nope".into()).unwrap();
        let removed = draft.remove_option(0, 0).unwrap();
        assert_eq!(removed.text_en, "Yes");
        assert_eq!(draft.snapshot().questions[0].options.len(), 1);
    }

    #[test]
    fn test_enum_text_forms_round_trip() {
        for t in [QuestionType::Rate, QuestionType::Choice, QuestionType::Text, QuestionType::YesNo] {
            assert_eq!(QuestionType::parse_str(t.as_str()), Some(t));
        }
        for t in [SurveyType::Satisfaction, SurveyType::Surveillance] {
            assert_eq!(SurveyType::parse_str(t.as_str()), Some(t));
        }
        assert_eq!(Language::parse_str("en"), Language::En);
        assert_eq!(Language::parse_str("de"), Language::Tr);
    }

    #[test]
    fn test_question_type_serde_wire_form() {
        assert_eq!(serde_json::to_string(&QuestionType::YesNo).unwrap(), r#""YES_NO""#);
        assert_eq!(serde_json::to_string(&Language::Tr).unwrap(), r#""tr""#);
    }
}

//! Demo survey data for local development

use crate::error::Result;
use crate::model::{
    NodeRef, OptionSnapshot, QuestionSnapshot, QuestionType, SurveySnapshot, SurveyType,
};
use crate::service::SurveyService;

fn question(
    question_type: QuestionType,
    text_tr: &str,
    text_en: &str,
    description: Option<(&str, &str)>,
    required: bool,
    order: i64,
    options: Vec<(&str, &str)>,
) -> QuestionSnapshot {
    QuestionSnapshot {
        ident: NodeRef::New,
        question_type,
        text_tr: text_tr.to_string(),
        text_en: text_en.to_string(),
        description_tr: description.map(|(tr, _)| tr.to_string()),
        description_en: description.map(|(_, en)| en.to_string()),
        required,
        order,
        options: options
            .into_iter()
            .map(|(tr, en)| OptionSnapshot {
                ident: NodeRef::New,
                text_tr: tr.to_string(),
                text_en: en.to_string(),
            })
            .collect(),
    }
}

/// The satisfaction survey shipped as demo content.
pub fn satisfaction_survey() -> SurveySnapshot {
    SurveySnapshot {
        title_tr: "Müşteri Memnuniyet Anketi".into(),
        title_en: "Customer Satisfaction Survey".into(),
        survey_type: SurveyType::Satisfaction,
        revision: None,
        questions: vec![
            question(
                QuestionType::Rate,
                "Genel olarak hizmetimizden ne kadar memnunsunuz?",
                "Overall, how satisfied are you with our service?",
                Some((
                    "1 (Hiç Memnun Değilim) - 5 (Çok Memnunum)",
                    "1 (Very Dissatisfied) - 5 (Very Satisfied)",
                )),
                true,
                1,
                vec![],
            ),
            question(
                QuestionType::Choice,
                "Bizi başkalarına tavsiye eder misiniz?",
                "Would you recommend us to others?",
                None,
                true,
                2,
                vec![("Evet", "Yes"), ("Hayır", "No"), ("Belki", "Maybe")],
            ),
            question(
                QuestionType::Text,
                "Hizmetimizi geliştirmek için önerileriniz nelerdir?",
                "What suggestions do you have to improve our service?",
                None,
                false,
                3,
                vec![],
            ),
        ],
    }
}

/// The post-sales surveillance survey shipped as demo content.
pub fn surveillance_survey() -> SurveySnapshot {
    SurveySnapshot {
        title_tr: "Satış Sonrası Gözetim Anketi".into(),
        title_en: "Post-Sales Surveillance Survey".into(),
        survey_type: SurveyType::Surveillance,
        revision: None,
        questions: vec![
            question(
                QuestionType::Rate,
                "Ürün kalitesinden memnun kaldınız mı?",
                "Were you satisfied with the product quality?",
                Some(("1-5 Puan veriniz", "Rate 1-5")),
                true,
                1,
                vec![],
            ),
            question(
                QuestionType::Choice,
                "Teslimat süreci nasıldı?",
                "How was the delivery process?",
                None,
                true,
                2,
                vec![("Hızlı", "Fast"), ("Normal", "Normal"), ("Yavaş", "Slow")],
            ),
            question(
                QuestionType::Text,
                "Eklemek istedikleriniz:",
                "Additional comments:",
                None,
                false,
                3,
                vec![],
            ),
        ],
    }
}

/// Create the demo surveys through the regular create path.
pub async fn seed(service: &SurveyService) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for snapshot in [satisfaction_survey(), surveillance_survey()] {
        let id = service.create_survey(&snapshot).await?;
        log::info!("Seeded survey '{}' ({})", snapshot.title_en, id);
        ids.push(id);
    }
    Ok(ids)
}

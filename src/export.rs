//! Excel export of survey responses for admin review

use anyhow::{Context, Result};
use rust_xlsxwriter::*;

use crate::model::{Language, QuestionSnapshot, ResponseRecord};

fn create_header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
}

fn create_title_format() -> Format {
    Format::new().set_bold().set_font_size(16)
}

/// Columns that precede the per-question columns.
const CONTACT_HEADERS: [&str; 6] = ["Submitted At", "Name", "Email", "Phone", "Company", "Language"];

/// Build the responses workbook: one row per response, one column per
/// question (ordered, localized), customer contact columns in front.
pub fn build_workbook(
    title: &str,
    questions: &[QuestionSnapshot],
    responses: &[ResponseRecord],
    language: Language,
) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Responses")?;

    let header_format = create_header_format();
    let title_format = create_title_format();

    sheet.write_string_with_format(0, 0, title, &title_format)?;

    for (col, header) in CONTACT_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(2, col as u16, *header, &header_format)?;
    }
    for (i, question) in questions.iter().enumerate() {
        let col = (CONTACT_HEADERS.len() + i) as u16;
        sheet.write_string_with_format(2, col, question.text(language), &header_format)?;
    }

    let mut row = 3u32;
    for response in responses {
        let info = &response.customer_info;
        sheet.write_string(row, 0, response.created_at.format("%Y-%m-%d %H:%M").to_string())?;
        sheet.write_string(row, 1, &info.full_name)?;
        sheet.write_string(row, 2, &info.email)?;
        sheet.write_string(row, 3, &info.phone)?;
        sheet.write_string(row, 4, &info.company_name)?;
        sheet.write_string(row, 5, response.language.as_str())?;

        for (i, question) in questions.iter().enumerate() {
            let value = question
                .ident
                .existing()
                .and_then(|qid| {
                    response
                        .answers
                        .iter()
                        .find(|a| a.question_id == qid)
                        .map(|a| a.value.as_str())
                })
                .unwrap_or("");
            let col = (CONTACT_HEADERS.len() + i) as u16;
            sheet.write_string(row, col, value)?;
        }

        row += 1;
    }

    sheet.autofit();
    Ok(workbook)
}

/// Export a survey's responses to an XLSX file.
pub fn export_to_file(
    path: &str,
    title: &str,
    questions: &[QuestionSnapshot],
    responses: &[ResponseRecord],
    language: Language,
) -> Result<()> {
    let mut workbook = build_workbook(title, questions, responses, language)?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path))?;

    log::info!("Exported {} responses to {}", responses.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::model::{AnswerRecord, CustomerInfo, NodeRef, QuestionType};

    fn question(id: &str, text_en: &str) -> QuestionSnapshot {
        QuestionSnapshot {
            ident: NodeRef::Existing(id.into()),
            question_type: QuestionType::Text,
            text_tr: format!("{text_en} (tr)"),
            text_en: text_en.into(),
            description_tr: None,
            description_en: None,
            required: true,
            order: 1,
            options: vec![],
        }
    }

    #[test]
    fn test_build_workbook_with_responses() {
        let questions = vec![question("q1", "Comments")];
        let responses = vec![ResponseRecord {
            id: "r1".into(),
            survey_id: "s1".into(),
            customer_info: CustomerInfo {
                full_name: "Ayşe".into(),
                email: "ayse@example.com".into(),
                phone: "555".into(),
                company_name: "Acme".into(),
                country: None,
                address: None,
            },
            language: Language::Tr,
            created_at: Utc::now(),
            answers: vec![AnswerRecord {
                question_id: "q1".into(),
                value: "Great service".into(),
            }],
        }];

        build_workbook("Survey", &questions, &responses, Language::En).unwrap();
    }

    #[test]
    fn test_build_workbook_empty_responses() {
        let questions = vec![question("q1", "Comments")];
        build_workbook("Survey", &questions, &[], Language::Tr).unwrap();
    }
}

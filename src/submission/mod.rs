//! Submission validation
//!
//! Pure checks over a survey's live question list and a submitted answer map.
//! IO-free so the rules can be tested without a store.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{CustomerInfo, Language, QuestionSnapshot, QuestionType};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Verify a submitted answer map against the survey's questions.
///
/// Every required question needs a non-blank answer. Provided answers are
/// type-checked even on optional questions: YES_NO accepts only the literal
/// English words "Yes"/"No" (case-sensitive, regardless of submission
/// language), CHOICE must match one of the question's option texts in the
/// declared language. Answers naming unknown question ids are rejected before
/// they can hit the storage layer.
pub fn validate_answers(
    questions: &[QuestionSnapshot],
    language: Language,
    answers: &BTreeMap<String, String>,
) -> Result<()> {
    for question in questions {
        let question_id = question
            .ident
            .existing()
            .ok_or_else(|| Error::validation("live questions must carry identifiers"))?;

        let answer = answers.get(question_id).map(String::as_str).unwrap_or("");
        let blank = answer.trim().is_empty();

        if blank {
            if question.required {
                return Err(Error::validation_for(
                    question_id,
                    format!("question '{}' requires an answer", question.text(language)),
                ));
            }
            continue;
        }

        match question.question_type {
            QuestionType::YesNo => {
                if answer != "Yes" && answer != "No" {
                    return Err(Error::validation_for(
                        question_id,
                        format!("question '{}' accepts only Yes or No", question.text(language)),
                    ));
                }
            }
            QuestionType::Choice => {
                let matches_option = question
                    .options
                    .iter()
                    .any(|option| option.text(language) == answer);
                if !matches_option {
                    return Err(Error::validation_for(
                        question_id,
                        format!(
                            "'{answer}' is not an option of question '{}'",
                            question.text(language)
                        ),
                    ));
                }
            }
            QuestionType::Rate | QuestionType::Text => {}
        }
    }

    let known: std::collections::HashSet<&str> = questions
        .iter()
        .filter_map(|q| q.ident.existing())
        .collect();
    for question_id in answers.keys() {
        if !known.contains(question_id.as_str()) {
            return Err(Error::validation_for(
                question_id,
                format!("answer references unknown question '{question_id}'"),
            ));
        }
    }

    Ok(())
}

/// Verify the contact record attached to a submission.
///
/// Name, phone and company are required; email may be empty but must be
/// well-formed when present.
pub fn validate_customer_info(info: &CustomerInfo) -> Result<()> {
    if info.full_name.trim().is_empty() {
        return Err(Error::validation("customer name is required"));
    }
    if info.phone.trim().is_empty() {
        return Err(Error::validation("customer phone is required"));
    }
    if info.company_name.trim().is_empty() {
        return Err(Error::validation("customer company is required"));
    }
    if !info.email.is_empty() && !EMAIL_RE.is_match(&info.email) {
        return Err(Error::validation(format!(
            "'{}' is not a valid email address",
            info.email
        )));
    }

    Ok(())
}

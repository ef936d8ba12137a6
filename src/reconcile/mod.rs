//! Survey definition reconciliation
//!
//! Synchronizes a persisted survey tree (survey → questions → options) with a
//! newly submitted snapshot in one transaction. Nodes carrying an identifier
//! are updated in place, nodes without one are created, persisted nodes
//! missing from the snapshot are deleted together with everything under them.
//! Kept identifiers are never recycled: stored answers reference question ids
//! directly, so destroying and recreating a question would orphan its history.

use std::collections::HashSet;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{Error, Result, storage};
use crate::model::{QuestionSnapshot, QuestionType, SurveySnapshot};
use crate::store::repository::surveys::{insert_option, insert_question};

/// Structural validation shared by the create and update flows.
///
/// Rejects blank bilingual fields, CHOICE questions without options, options
/// on non-CHOICE questions and duplicate order values.
pub fn validate_snapshot(snapshot: &SurveySnapshot) -> Result<()> {
    if snapshot.title_tr.trim().is_empty() || snapshot.title_en.trim().is_empty() {
        return Err(Error::validation("survey title must be set in both languages"));
    }

    let mut seen_orders = HashSet::new();
    for question in &snapshot.questions {
        let label = question_label(question);

        if question.text_tr.trim().is_empty() || question.text_en.trim().is_empty() {
            return Err(validation_at(
                question,
                format!("question {label} must have text in both languages"),
            ));
        }

        if !seen_orders.insert(question.order) {
            return Err(validation_at(
                question,
                format!("question {label} reuses order value {}", question.order),
            ));
        }

        match question.question_type {
            QuestionType::Choice => {
                if question.options.is_empty() {
                    return Err(validation_at(
                        question,
                        format!("CHOICE question {label} must have at least one option"),
                    ));
                }
                for option in &question.options {
                    if option.text_tr.trim().is_empty() || option.text_en.trim().is_empty() {
                        return Err(validation_at(
                            question,
                            format!("question {label} has an option with blank text"),
                        ));
                    }
                }
            }
            _ => {
                if !question.options.is_empty() {
                    return Err(validation_at(
                        question,
                        format!("question {label} is not CHOICE and cannot carry options"),
                    ));
                }
            }
        }
    }

    Ok(())
}

fn question_label(question: &QuestionSnapshot) -> String {
    match question.ident.existing() {
        Some(id) => format!("'{id}'"),
        None => format!("#{}", question.order),
    }
}

fn validation_at(question: &QuestionSnapshot, reason: String) -> Error {
    match question.ident.existing() {
        Some(id) => Error::validation_for(id, reason),
        None => Error::validation(reason),
    }
}

/// Apply an incoming snapshot to the persisted survey `survey_id`.
///
/// Runs as a single unit of work: any failure rolls the transaction back and
/// leaves storage in its pre-operation state. Deletions run before upserts so
/// removing one question and adding another in the same edit cannot collide.
pub async fn apply(pool: &SqlitePool, survey_id: &str, incoming: &SurveySnapshot) -> Result<()> {
    validate_snapshot(incoming)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(storage("Failed to start reconciliation transaction"))?;

    // Survey scalar fields first; this also establishes the survey exists.
    let result = sqlx::query(
        r#"
        UPDATE surveys
        SET title_tr = ?, title_en = ?, type = ?, revision = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&incoming.title_tr)
    .bind(&incoming.title_en)
    .bind(incoming.survey_type.as_str())
    .bind(&incoming.revision)
    .bind(survey_id)
    .execute(&mut *tx)
    .await
    .map_err(storage(format!("Failed to update survey '{survey_id}'")))?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("survey", survey_id));
    }

    let existing_ids: Vec<String> =
        sqlx::query_scalar("SELECT id FROM questions WHERE survey_id = ?")
            .bind(survey_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(storage(format!(
                "Failed to load question ids for survey '{survey_id}'"
            )))?;

    let kept: HashSet<&str> = incoming
        .questions
        .iter()
        .filter_map(|q| q.ident.existing())
        .collect();

    // Questions dropped from the snapshot go first, children before parents:
    // answers, then options, then the question row itself.
    let mut deleted = 0;
    for question_id in existing_ids.iter().filter(|id| !kept.contains(id.as_str())) {
        sqlx::query("DELETE FROM answers WHERE question_id = ?")
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(storage(format!(
                "Failed to delete answers of question '{question_id}'"
            )))?;

        sqlx::query("DELETE FROM options WHERE question_id = ?")
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(storage(format!(
                "Failed to delete options of question '{question_id}'"
            )))?;

        sqlx::query("DELETE FROM questions WHERE id = ?")
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(storage(format!("Failed to delete question '{question_id}'")))?;

        deleted += 1;
    }

    let mut created = 0;
    for question in &incoming.questions {
        match question.ident.existing() {
            Some(question_id) => {
                update_question(&mut tx, survey_id, question_id, question).await?;
                sync_options(&mut tx, question_id, question).await?;
            }
            None => {
                let question_id = Uuid::new_v4().to_string();
                insert_question(&mut tx, survey_id, &question_id, question).await?;
                for option in &question.options {
                    insert_option(&mut tx, &question_id, option).await?;
                }
                created += 1;
            }
        }
    }

    tx.commit()
        .await
        .map_err(storage("Failed to commit reconciliation transaction"))?;

    log::info!(
        "Reconciled survey {}: {} kept, {} created, {} deleted",
        survey_id,
        kept.len(),
        created,
        deleted
    );
    Ok(())
}

/// Update a kept question's scalar fields in place, identifier untouched.
async fn update_question(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    survey_id: &str,
    question_id: &str,
    question: &QuestionSnapshot,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE questions
        SET type = ?, text_tr = ?, text_en = ?, description_tr = ?, description_en = ?,
            required = ?, position = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND survey_id = ?
        "#,
    )
    .bind(question.question_type.as_str())
    .bind(&question.text_tr)
    .bind(&question.text_en)
    .bind(&question.description_tr)
    .bind(&question.description_en)
    .bind(question.required)
    .bind(question.order)
    .bind(question_id)
    .bind(survey_id)
    .execute(&mut **tx)
    .await
    .map_err(storage(format!("Failed to update question '{question_id}'")))?;

    // Zero rows means the id does not exist or belongs to another survey.
    if result.rows_affected() == 0 {
        return Err(Error::not_found("question", question_id));
    }

    Ok(())
}

/// The nested option pass for a kept question: same partition/delete/upsert
/// logic as the question level, scoped to one parent.
async fn sync_options(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    question_id: &str,
    question: &QuestionSnapshot,
) -> Result<()> {
    if question.question_type != QuestionType::Choice {
        // A question edited away from CHOICE must not keep stale options.
        sqlx::query("DELETE FROM options WHERE question_id = ?")
            .bind(question_id)
            .execute(&mut **tx)
            .await
            .map_err(storage(format!(
                "Failed to clear options of question '{question_id}'"
            )))?;
        return Ok(());
    }

    let existing_ids: Vec<String> =
        sqlx::query_scalar("SELECT id FROM options WHERE question_id = ?")
            .bind(question_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(storage(format!(
                "Failed to load option ids for question '{question_id}'"
            )))?;

    let kept: HashSet<&str> = question
        .options
        .iter()
        .filter_map(|o| o.ident.existing())
        .collect();

    for option_id in existing_ids.iter().filter(|id| !kept.contains(id.as_str())) {
        sqlx::query("DELETE FROM options WHERE id = ?")
            .bind(option_id)
            .execute(&mut **tx)
            .await
            .map_err(storage(format!("Failed to delete option '{option_id}'")))?;
    }

    for option in &question.options {
        match option.ident.existing() {
            Some(option_id) => {
                let result = sqlx::query(
                    "UPDATE options SET text_tr = ?, text_en = ? WHERE id = ? AND question_id = ?",
                )
                .bind(&option.text_tr)
                .bind(&option.text_en)
                .bind(option_id)
                .bind(question_id)
                .execute(&mut **tx)
                .await
                .map_err(storage(format!("Failed to update option '{option_id}'")))?;

                if result.rows_affected() == 0 {
                    return Err(Error::not_found("option", option_id));
                }
            }
            None => {
                insert_option(tx, question_id, option).await?;
            }
        }
    }

    Ok(())
}

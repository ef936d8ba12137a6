//! Repository for response and answer operations

use std::collections::BTreeMap;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{Error, Result, storage};
use crate::model::{AnswerRecord, CustomerInfo, Language, ResponseRecord};
use crate::store::models::{DbAnswer, DbResponse};

/// Persist one response with all of its answers atomically. Either the whole
/// submission lands or none of it does.
pub async fn insert(
    pool: &SqlitePool,
    survey_id: &str,
    customer_info: &CustomerInfo,
    language: Language,
    answers: &BTreeMap<String, String>,
) -> Result<String> {
    let customer_json =
        serde_json::to_string(customer_info).map_err(|e| Error::Storage {
            context: "Failed to serialize customer info".to_string(),
            source: sqlx::Error::Encode(Box::new(e)),
        })?;

    let mut tx = pool
        .begin()
        .await
        .map_err(storage("Failed to start submit-response transaction"))?;

    let response_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO responses (id, survey_id, customer_info, language) VALUES (?, ?, ?, ?)",
    )
    .bind(&response_id)
    .bind(survey_id)
    .bind(&customer_json)
    .bind(language.as_str())
    .execute(&mut *tx)
    .await
    .map_err(storage(format!(
        "Failed to insert response for survey '{survey_id}'"
    )))?;

    for (question_id, value) in answers {
        sqlx::query(
            "INSERT INTO answers (id, response_id, question_id, value) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&response_id)
        .bind(question_id)
        .bind(value)
        .execute(&mut *tx)
        .await
        .map_err(storage(format!(
            "Failed to insert answer for question '{question_id}'"
        )))?;
    }

    tx.commit()
        .await
        .map_err(storage("Failed to commit submit-response transaction"))?;

    log::info!(
        "Recorded response {} for survey {} ({} answers)",
        response_id,
        survey_id,
        answers.len()
    );
    Ok(response_id)
}

/// All responses for a survey with their answers, oldest first.
pub async fn list_for_survey(pool: &SqlitePool, survey_id: &str) -> Result<Vec<ResponseRecord>> {
    let response_rows: Vec<DbResponse> = sqlx::query_as(
        r#"
        SELECT id, survey_id, customer_info, language, created_at
        FROM responses
        WHERE survey_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await
    .map_err(storage(format!(
        "Failed to list responses for survey '{survey_id}'"
    )))?;

    let answer_rows: Vec<DbAnswer> = sqlx::query_as(
        r#"
        SELECT a.id, a.response_id, a.question_id, a.value
        FROM answers a
        JOIN responses r ON a.response_id = r.id
        WHERE r.survey_id = ?
        ORDER BY a.rowid
        "#,
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await
    .map_err(storage(format!(
        "Failed to list answers for survey '{survey_id}'"
    )))?;

    let mut records = Vec::with_capacity(response_rows.len());
    for row in response_rows {
        let customer_info: CustomerInfo =
            serde_json::from_str(&row.customer_info).map_err(|e| Error::Storage {
                context: format!("Failed to deserialize customer info for response '{}'", row.id),
                source: sqlx::Error::Decode(Box::new(e)),
            })?;

        let answers = answer_rows
            .iter()
            .filter(|a| a.response_id == row.id)
            .map(|a| AnswerRecord {
                question_id: a.question_id.clone(),
                value: a.value.clone(),
            })
            .collect();

        records.push(ResponseRecord {
            id: row.id,
            survey_id: row.survey_id,
            customer_info,
            language: Language::parse_str(&row.language),
            created_at: row.created_at,
            answers,
        });
    }

    Ok(records)
}

/// Delete a single response and its answers.
pub async fn delete(pool: &SqlitePool, response_id: &str) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(storage("Failed to start delete-response transaction"))?;

    sqlx::query("DELETE FROM answers WHERE response_id = ?")
        .bind(response_id)
        .execute(&mut *tx)
        .await
        .map_err(storage("Failed to delete answers"))?;

    let result = sqlx::query("DELETE FROM responses WHERE id = ?")
        .bind(response_id)
        .execute(&mut *tx)
        .await
        .map_err(storage(format!(
            "Failed to delete response '{response_id}'"
        )))?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("response", response_id));
    }

    tx.commit()
        .await
        .map_err(storage("Failed to commit delete-response transaction"))?;

    log::info!("Deleted response {}", response_id);
    Ok(())
}

/// Count answers referencing a question. Used by tests to assert cascade
/// behavior during reconciliation.
pub async fn count_answers_for_question(pool: &SqlitePool, question_id: &str) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE question_id = ?")
        .bind(question_id)
        .fetch_one(pool)
        .await
        .map_err(storage(format!(
            "Failed to count answers for question '{question_id}'"
        )))
}

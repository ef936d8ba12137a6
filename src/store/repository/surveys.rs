//! Repository for survey definition operations

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{Error, Result, storage};
use crate::model::{
    NodeRef, OptionSnapshot, QuestionSnapshot, SurveyRecord, SurveySnapshot, SurveySummary,
};
use crate::store::models::{DbOption, DbQuestion, DbSurvey, decode_question_type, decode_survey_type};

/// Insert a complete survey tree. Every row is created fresh; identifiers on
/// the incoming snapshot are ignored, matching the authoring create flow.
pub async fn insert_tree(pool: &SqlitePool, snapshot: &SurveySnapshot) -> Result<String> {
    let mut tx = pool
        .begin()
        .await
        .map_err(storage("Failed to start create-survey transaction"))?;

    let survey_id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO surveys (id, title_tr, title_en, type, revision)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&survey_id)
    .bind(&snapshot.title_tr)
    .bind(&snapshot.title_en)
    .bind(snapshot.survey_type.as_str())
    .bind(&snapshot.revision)
    .execute(&mut *tx)
    .await
    .map_err(storage("Failed to insert survey"))?;

    for question in &snapshot.questions {
        let question_id = Uuid::new_v4().to_string();
        insert_question(&mut tx, &survey_id, &question_id, question).await?;
        for option in &question.options {
            insert_option(&mut tx, &question_id, option).await?;
        }
    }

    tx.commit()
        .await
        .map_err(storage("Failed to commit create-survey transaction"))?;

    log::info!(
        "Created survey {} with {} questions",
        survey_id,
        snapshot.questions.len()
    );
    Ok(survey_id)
}

pub(crate) async fn insert_question(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    survey_id: &str,
    question_id: &str,
    question: &QuestionSnapshot,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO questions (
            id, survey_id, type, text_tr, text_en,
            description_tr, description_en, required, position
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(question_id)
    .bind(survey_id)
    .bind(question.question_type.as_str())
    .bind(&question.text_tr)
    .bind(&question.text_en)
    .bind(&question.description_tr)
    .bind(&question.description_en)
    .bind(question.required)
    .bind(question.order)
    .execute(&mut **tx)
    .await
    .map_err(storage(format!("Failed to insert question '{question_id}'")))?;

    Ok(())
}

pub(crate) async fn insert_option(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    question_id: &str,
    option: &OptionSnapshot,
) -> Result<String> {
    let option_id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO options (id, question_id, text_tr, text_en) VALUES (?, ?, ?, ?)")
        .bind(&option_id)
        .bind(question_id)
        .bind(&option.text_tr)
        .bind(&option.text_en)
        .execute(&mut **tx)
        .await
        .map_err(storage(format!(
            "Failed to insert option for question '{question_id}'"
        )))?;

    Ok(option_id)
}

/// Fetch the full persisted tree for the editor.
pub async fn get(pool: &SqlitePool, survey_id: &str) -> Result<Option<SurveyRecord>> {
    let row: Option<DbSurvey> = sqlx::query_as(
        "SELECT id, title_tr, title_en, type, revision, created_at, updated_at FROM surveys WHERE id = ?",
    )
    .bind(survey_id)
    .fetch_optional(pool)
    .await
    .map_err(storage(format!("Failed to get survey '{survey_id}'")))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let questions = fetch_questions(pool, survey_id).await?;

    Ok(Some(SurveyRecord {
        id: row.id,
        created_at: row.created_at,
        updated_at: row.updated_at,
        snapshot: SurveySnapshot {
            title_tr: row.title_tr,
            title_en: row.title_en,
            survey_type: decode_survey_type(&row.r#type)?,
            revision: row.revision,
            questions,
        },
    }))
}

/// Ordered question list with options, identifiers populated. Used by the
/// editor load, the respondent view and submission validation.
pub async fn fetch_questions(pool: &SqlitePool, survey_id: &str) -> Result<Vec<QuestionSnapshot>> {
    let question_rows: Vec<DbQuestion> = sqlx::query_as(
        r#"
        SELECT id, survey_id, type, text_tr, text_en,
               description_tr, description_en, required, position
        FROM questions
        WHERE survey_id = ?
        ORDER BY position
        "#,
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await
    .map_err(storage(format!(
        "Failed to fetch questions for survey '{survey_id}'"
    )))?;

    // Options for the whole survey in one pass, insertion order within each
    // question.
    let option_rows: Vec<DbOption> = sqlx::query_as(
        r#"
        SELECT o.id, o.question_id, o.text_tr, o.text_en
        FROM options o
        JOIN questions q ON o.question_id = q.id
        WHERE q.survey_id = ?
        ORDER BY o.rowid
        "#,
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await
    .map_err(storage(format!(
        "Failed to fetch options for survey '{survey_id}'"
    )))?;

    let mut questions = Vec::with_capacity(question_rows.len());
    for q in question_rows {
        let options = option_rows
            .iter()
            .filter(|o| o.question_id == q.id)
            .map(|o| OptionSnapshot {
                ident: NodeRef::Existing(o.id.clone()),
                text_tr: o.text_tr.clone(),
                text_en: o.text_en.clone(),
            })
            .collect();

        questions.push(QuestionSnapshot {
            ident: NodeRef::Existing(q.id),
            question_type: decode_question_type(&q.r#type)?,
            text_tr: q.text_tr,
            text_en: q.text_en,
            description_tr: q.description_tr,
            description_en: q.description_en,
            required: q.required,
            order: q.position,
            options,
        });
    }

    Ok(questions)
}

/// List all surveys with question/response counts, newest first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<SurveySummary>> {
    let rows: Vec<(String, String, String, String, Option<String>, i64, i64, chrono::DateTime<chrono::Utc>)> =
        sqlx::query_as(
            r#"
            SELECT s.id, s.title_tr, s.title_en, s.type, s.revision,
                   (SELECT COUNT(*) FROM questions q WHERE q.survey_id = s.id),
                   (SELECT COUNT(*) FROM responses r WHERE r.survey_id = s.id),
                   s.created_at
            FROM surveys s
            ORDER BY s.created_at DESC, s.rowid DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(storage("Failed to list surveys"))?;

    let mut summaries = Vec::with_capacity(rows.len());
    for (id, title_tr, title_en, survey_type, revision, question_count, response_count, created_at) in rows {
        summaries.push(SurveySummary {
            id,
            title_tr,
            title_en,
            survey_type: decode_survey_type(&survey_type)?,
            revision,
            question_count,
            response_count,
            created_at,
        });
    }

    Ok(summaries)
}

/// Check whether a survey exists.
pub async fn exists(pool: &SqlitePool, survey_id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM surveys WHERE id = ?")
        .bind(survey_id)
        .fetch_one(pool)
        .await
        .map_err(storage(format!(
            "Failed to check if survey '{survey_id}' exists"
        )))?;

    Ok(count > 0)
}

/// Delete a survey and everything under it. Children go before parents so the
/// delete order holds even without foreign-key cascade support.
pub async fn delete(pool: &SqlitePool, survey_id: &str) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(storage("Failed to start delete-survey transaction"))?;

    sqlx::query(
        "DELETE FROM answers WHERE response_id IN (SELECT id FROM responses WHERE survey_id = ?)",
    )
    .bind(survey_id)
    .execute(&mut *tx)
    .await
    .map_err(storage("Failed to delete answers"))?;

    sqlx::query("DELETE FROM responses WHERE survey_id = ?")
        .bind(survey_id)
        .execute(&mut *tx)
        .await
        .map_err(storage("Failed to delete responses"))?;

    sqlx::query(
        "DELETE FROM options WHERE question_id IN (SELECT id FROM questions WHERE survey_id = ?)",
    )
    .bind(survey_id)
    .execute(&mut *tx)
    .await
    .map_err(storage("Failed to delete options"))?;

    sqlx::query("DELETE FROM questions WHERE survey_id = ?")
        .bind(survey_id)
        .execute(&mut *tx)
        .await
        .map_err(storage("Failed to delete questions"))?;

    let result = sqlx::query("DELETE FROM surveys WHERE id = ?")
        .bind(survey_id)
        .execute(&mut *tx)
        .await
        .map_err(storage(format!("Failed to delete survey '{survey_id}'")))?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("survey", survey_id));
    }

    tx.commit()
        .await
        .map_err(storage("Failed to commit delete-survey transaction"))?;

    log::info!("Deleted survey {}", survey_id);
    Ok(())
}

//! Synchronous AI study tools: summaries, tag suggestions, quizzes,
//! and study plans.
//!
//! Generation goes through the configured fallback chain (primary
//! provider, then secondary). There is no job queue; callers wait for
//! the provider round trip.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use paperstack_core::{ActivityKind, Document, DocumentRepository, ShareRole};
use paperstack_inference::{
    build_quiz_prompt, build_study_plan_prompt, build_summary_prompt, build_tag_prompt, parse_quiz,
    parse_tag_suggestions, tasks, DocumentBrief, GenerationBackend,
};

use super::require_document_role;
use crate::{ApiError, AppState, RequireAuth};

pub(crate) fn backend(state: &AppState) -> Result<&(dyn GenerationBackend + Send + Sync), ApiError> {
    state
        .inference
        .as_deref()
        .ok_or_else(|| ApiError::Unavailable("No AI provider is configured".to_string()))
}

fn require_text(document: &Document) -> Result<&str, ApiError> {
    document
        .extracted_text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("Document has no extracted text yet".to_string())
        })
}

/// POST /api/v1/documents/:id/summarize
pub async fn summarize_document(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Editor).await?;
    let text = require_text(&document)?;

    let summary = backend(&state)?
        .generate(tasks::SUMMARY_SYSTEM, &build_summary_prompt(text))
        .await?;
    let summary = summary.trim().to_string();

    state.db.documents.update_summary(id, &summary).await?;
    state
        .db
        .activity
        .record(
            auth.session.account_id,
            ActivityKind::Summarize,
            Some(id),
            json!({}),
        )
        .await?;

    Ok(Json(json!({ "summary": summary })))
}

/// POST /api/v1/documents/:id/suggest-tags
pub async fn suggest_tags(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Editor).await?;
    let text = require_text(&document)?;

    let response = backend(&state)?
        .generate(tasks::TAG_SYSTEM, &build_tag_prompt(text))
        .await?;
    let suggestions = parse_tag_suggestions(&response);

    state.db.documents.update_ai_tags(id, &suggestions).await?;
    Ok(Json(json!({ "tags": suggestions })))
}

#[derive(Debug, Default, Deserialize)]
pub struct QuizRequest {
    pub num_questions: Option<u32>,
}

/// POST /api/v1/documents/:id/quiz
pub async fn generate_quiz(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<QuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer).await?;
    let text = require_text(&document)?;

    let num_questions = req.num_questions.unwrap_or(5).clamp(1, 20);
    let response = backend(&state)?
        .generate(tasks::QUIZ_SYSTEM, &build_quiz_prompt(text, num_questions))
        .await?;
    let questions = parse_quiz(&response)?;

    Ok(Json(json!({ "questions": questions })))
}

#[derive(Debug, Deserialize)]
pub struct StudyPlanRequest {
    pub subject: Option<String>,
    pub document_ids: Option<Vec<Uuid>>,
    pub days: Option<u32>,
}

/// POST /api/v1/study-plan
///
/// Plans over an explicit document selection, or over the caller's
/// library filtered by subject.
pub async fn generate_study_plan(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(req): Json<StudyPlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let days = req.days.unwrap_or(7).clamp(1, 30);

    let ids: Vec<Uuid> = match &req.document_ids {
        Some(ids) if !ids.is_empty() => ids.clone(),
        _ => {
            let page = state
                .db
                .documents
                .list(paperstack_core::ListDocumentsRequest {
                    owner_id: auth.session.account_id,
                    year: None,
                    subject: req.subject.clone().filter(|s| !s.trim().is_empty()),
                    tags: Vec::new(),
                    limit: paperstack_core::defaults::MAX_PAGE_SIZE,
                    offset: 0,
                })
                .await?;
            page.data.into_iter().map(|d| d.id).collect()
        }
    };

    if ids.is_empty() {
        return Err(ApiError::BadRequest(
            "No documents to plan over".to_string(),
        ));
    }

    let mut briefs = Vec::with_capacity(ids.len());
    for id in ids {
        let document = state.db.documents.fetch(id).await?;
        require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer)
            .await?;
        briefs.push(DocumentBrief {
            filename: document.original_filename,
            subject: document.subject,
            year: document.year,
            summary: document.summary,
        });
    }

    let plan = backend(&state)?
        .generate(
            tasks::STUDY_PLAN_SYSTEM,
            &build_study_plan_prompt(&briefs, days),
        )
        .await?;

    Ok(Json(json!({ "plan": plan, "days": days })))
}

//! Read-only catalogs: glossary terms, schemes, languages, expense categories

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use fingenie_core::{ExpenseCategory, Language, SchemeEntry, SchemeGroup, TermEntry};

pub async fn list_terms(State(state): State<Arc<AppState>>) -> Json<Vec<TermEntry>> {
    Json(state.resolver.terms().to_vec())
}

#[derive(Debug, Deserialize)]
pub struct SchemeQuery {
    /// Beneficiary group filter (e.g. "farmer", "sc-st")
    pub group: Option<String>,
}

pub async fn list_schemes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SchemeQuery>,
) -> Result<Json<Vec<SchemeEntry>>, AppError> {
    let schemes = match query.group.as_deref() {
        Some(raw) => {
            let group: SchemeGroup = raw.parse().map_err(|e: String| AppError::bad_request(&e))?;
            state.resolver.schemes_in(group).into_iter().cloned().collect()
        }
        None => state.resolver.schemes().to_vec(),
    };
    Ok(Json(schemes))
}

#[derive(Debug, Serialize)]
pub struct LabeledOption {
    pub id: &'static str,
    pub label: &'static str,
}

pub async fn list_scheme_groups() -> Json<Vec<LabeledOption>> {
    Json(
        SchemeGroup::all()
            .iter()
            .map(|g| LabeledOption {
                id: g.as_str(),
                label: g.label(),
            })
            .collect(),
    )
}

pub async fn list_languages() -> Json<Vec<LabeledOption>> {
    Json(
        Language::all()
            .iter()
            .map(|l| LabeledOption {
                id: l.code(),
                label: l.label(),
            })
            .collect(),
    )
}

pub async fn list_expense_categories() -> Json<Vec<&'static str>> {
    Json(ExpenseCategory::all().iter().map(|c| c.as_str()).collect())
}

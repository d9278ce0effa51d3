//! Handlers for the `/api/*` routes.
//!
//! Handlers only decode, delegate to `linkmap-core` and style the result.
//! Storage calls run through [`AppState::with_db`].

use super::AppState;
use super::auth::Owner;
use super::error::ApiError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use linkmap_core::model::{CardMember, GraphCardSummary, GraphNode, NewCard, NodeRole, SearchHit, Seed};
use linkmap_core::style::{StyledGraph, StyledNode};
use linkmap_core::{GraphAssembler, GraphPersistence, SearchIndex};
use linkmap_ingest::LinkObservation;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UrlQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdQuery {
    pub query: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardSource {
    pub id: i64,
    pub num: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCardRequest {
    pub graph_id: Uuid,
    #[serde(default)]
    pub description: String,
    pub sources: Vec<CardSource>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardRef {
    pub graph_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CardSummaryBody {
    pub graph_id: Uuid,
    pub cnt: i64,
    pub description: String,
    pub created: DateTime<Utc>,
}

impl From<GraphCardSummary> for CardSummaryBody {
    fn from(card: GraphCardSummary) -> Self {
        Self {
            graph_id: card.card_id,
            cnt: card.member_count,
            description: card.description,
            created: card.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    pub query: Option<String>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(format!("Bad Request. {}", rejection.body_text())))
}

fn summaries(cards: Vec<GraphCardSummary>) -> Vec<CardSummaryBody> {
    cards.into_iter().map(CardSummaryBody::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /ping
pub async fn ping(State(state): State<AppState>) -> Response {
    match state.with_db(|db| Ok(db.ping())).await {
        Ok(true) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
            .into_response(),
    }
}

/// POST /api/search
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let req = body(payload)?;
    let hits = state
        .with_db(move |db| SearchIndex::new(db).search(&req.text))
        .await?;
    Ok(Json(hits))
}

async fn expand(state: &AppState, seed: Seed) -> Result<Json<StyledGraph>, ApiError> {
    let graph = state
        .with_db(move |db| GraphAssembler::new(db).expand(&seed))
        .await?;
    Ok(Json(state.styles.style_graph(&graph)))
}

/// POST /api/graph
pub async fn graph_by_url(
    State(state): State<AppState>,
    payload: Result<Json<UrlQuery>, JsonRejection>,
) -> Result<Json<StyledGraph>, ApiError> {
    let req = body(payload)?;
    expand(&state, Seed::Url(req.query)).await
}

/// POST /api/graph/id
pub async fn graph_by_id(
    State(state): State<AppState>,
    payload: Result<Json<IdQuery>, JsonRejection>,
) -> Result<Json<StyledGraph>, ApiError> {
    let req = body(payload)?;
    expand(&state, Seed::Id(req.query)).await
}

/// GET /api/graph/full
pub async fn full_graph(State(state): State<AppState>) -> Result<Json<StyledGraph>, ApiError> {
    let graph = state
        .with_db(|db| GraphAssembler::new(db).full_graph())
        .await?;
    Ok(Json(state.styles.style_graph(&graph)))
}

async fn source(state: &AppState, seed: Seed) -> Result<Json<StyledNode>, ApiError> {
    let page = state
        .with_db(move |db| GraphAssembler::new(db).resolve_seed(&seed))
        .await?;
    let node = GraphNode::from_page(page, NodeRole::Seed);
    Ok(Json(state.styles.style_node(&node)))
}

/// POST /api/source
pub async fn source_by_url(
    State(state): State<AppState>,
    payload: Result<Json<UrlQuery>, JsonRejection>,
) -> Result<Json<StyledNode>, ApiError> {
    let req = body(payload)?;
    source(&state, Seed::Url(req.query)).await
}

/// POST /api/source/id
pub async fn source_by_id(
    State(state): State<AppState>,
    payload: Result<Json<IdQuery>, JsonRejection>,
) -> Result<Json<StyledNode>, ApiError> {
    let req = body(payload)?;
    source(&state, Seed::Id(req.query)).await
}

/// POST /api/cards
pub async fn save_card(
    State(state): State<AppState>,
    Owner(owner): Owner,
    payload: Result<Json<NewCardRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CardSummaryBody>), ApiError> {
    let req = body(payload)?;
    let card = NewCard {
        card_id: req.graph_id,
        description: req.description,
        members: req
            .sources
            .iter()
            .map(|s| CardMember {
                node_id: s.id,
                ordinal: s.num,
            })
            .collect(),
    };
    let summary = state
        .with_db(move |db| GraphPersistence::new(db).save(owner, card))
        .await?;
    Ok((StatusCode::CREATED, Json(summary.into())))
}

/// GET /api/cards
pub async fn list_cards(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<Vec<CardSummaryBody>>, ApiError> {
    let cards = state
        .with_db(move |db| GraphPersistence::new(db).list(owner))
        .await?;
    Ok(Json(summaries(cards)))
}

/// DELETE /api/cards
pub async fn delete_card(
    State(state): State<AppState>,
    Owner(owner): Owner,
    payload: Result<Json<CardRef>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<CardSummaryBody>>), ApiError> {
    let req = body(payload)?;
    let cards = state
        .with_db(move |db| GraphPersistence::new(db).soft_delete(owner, req.graph_id))
        .await?;
    Ok((StatusCode::ACCEPTED, Json(summaries(cards))))
}

/// POST /api/cards/recall
///
/// Any authenticated caller may recall a card by id.
pub async fn recall_card(
    State(state): State<AppState>,
    Owner(_owner): Owner,
    payload: Result<Json<CardRef>, JsonRejection>,
) -> Result<Json<StyledGraph>, ApiError> {
    let req = body(payload)?;
    let card = state
        .with_db(move |db| GraphPersistence::new(db).recall(req.graph_id))
        .await?;
    Ok(Json(state.styles.style_card(&card)))
}

/// POST /api/observations
///
/// The batch is validated as a whole before anything is folded in.
pub async fn observe(
    State(state): State<AppState>,
    payload: Result<Json<Vec<LinkObservation>>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let observations = body(payload)?;
    for (idx, observation) in observations.iter().enumerate() {
        observation
            .validate(idx + 1)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    }

    for observation in &observations {
        observation.fold_into(&state.live);
    }
    debug!("Folded {} live observations", observations.len());

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "accepted": observations.len() })),
    ))
}

/// GET /api/live?query=<label>
pub async fn live(State(state): State<AppState>, Query(params): Query<LiveQuery>) -> Json<Vec<StyledNode>> {
    let mut nodes = state.live.snapshot(params.query.as_deref());
    nodes.sort_by_key(|n| n.id);
    debug!("Live snapshot with {} nodes", nodes.len());
    Json(nodes.iter().map(|n| state.styles.style_node(n)).collect())
}

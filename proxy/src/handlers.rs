//! Request handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Json,
};
use ballot_sync::read_candidates;
use ballot_types::{Address, Candidate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ProxyError;
use crate::server::ProxyState;

// ── Candidates ───────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub id: u64,
    pub name: String,
    pub votes: u64,
}

impl From<Candidate> for CandidateEntry {
    fn from(c: Candidate) -> Self {
        Self {
            id: c.id,
            name: c.name,
            votes: c.vote_count,
        }
    }
}

pub async fn candidates(
    State(state): State<ProxyState>,
) -> Result<Json<Vec<CandidateEntry>>, ProxyError> {
    let metrics = state.metrics.as_deref();
    if let Some(m) = metrics {
        m.record_request("candidates");
    }

    let timer = metrics.map(|m| m.candidates_latency_seconds.start_timer());
    let result = read_candidates(state.gateway.clone()).await;
    drop(timer);

    match result {
        Ok(list) => Ok(Json(list.into_iter().map(CandidateEntry::from).collect())),
        Err(e) => {
            warn!("candidate listing failed: {e}");
            if let Some(m) = metrics {
                m.read_failures.inc();
            }
            Err(ProxyError::Read(e.message()))
        }
    }
}

// ── Vote ─────────────────────────────────────────────────────────────────

/// Candidate id as sent by clients: a JSON number or a decimal string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CandidateId {
    Number(u64),
    Text(String),
}

impl CandidateId {
    fn value(&self) -> Result<u64, ProxyError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ProxyError::Vote(format!("invalid candidateId {s:?}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    candidate_id: CandidateId,
    voter_address: Address,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub success: bool,
    pub transaction_hash: String,
}

pub async fn vote(
    State(state): State<ProxyState>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, ProxyError> {
    let metrics = state.metrics.as_deref();
    if let Some(m) = metrics {
        m.record_request("vote");
    }

    let result = async {
        let Json(request) = payload.map_err(|e| ProxyError::Vote(e.body_text()))?;
        let candidate_id = request.candidate_id.value()?;
        state
            .gateway
            .vote(&request.voter_address, candidate_id)
            .await
            .map(|receipt| (request.voter_address, candidate_id, receipt))
            .map_err(|e| ProxyError::Vote(e.message()))
    }
    .await;

    match result {
        Ok((voter, candidate_id, receipt)) => {
            info!(%voter, candidate_id, tx = %receipt.transaction_hash, "vote relayed");
            if let Some(m) = metrics {
                m.votes_accepted.inc();
            }
            Ok(Json(VoteResponse {
                success: true,
                transaction_hash: receipt.transaction_hash,
            }))
        }
        Err(e) => {
            warn!("vote failed: {e}");
            if let Some(m) = metrics {
                m.votes_failed.inc();
            }
            Err(e)
        }
    }
}

// ── Metrics ──────────────────────────────────────────────────────────────

pub async fn metrics(State(state): State<ProxyState>) -> Result<impl IntoResponse, ProxyError> {
    let metrics = state.metrics.as_deref().ok_or(ProxyError::MetricsDisabled)?;
    let body = metrics.encode()?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

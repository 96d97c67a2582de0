//! Agents, airlines and system users: the three managed directories.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use ticketpro_core::{Actor, Permission};
use ticketpro_directory::{Agent, Airline, NewAgent, NewAirline, NewUser, SystemUser};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct CommissionPayment {
    amount: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/agents", get(list_agents).post(create_agent))
        .route("/v1/agents/{id}", get(get_agent).delete(delete_agent))
        .route("/v1/agents/{id}/toggle", post(toggle_agent))
        .route("/v1/agents/{id}/commission/pay", post(pay_commission))
        .route("/v1/airlines", get(list_airlines).post(create_airline))
        .route("/v1/airlines/{id}", get(get_airline).delete(delete_airline))
        .route("/v1/airlines/{id}/toggle", post(toggle_airline))
        .route("/v1/users", get(list_users).post(create_user))
        .route("/v1/users/{id}", axum::routing::delete(delete_user))
        .route("/v1/users/{id}/toggle", post(toggle_user))
}

// ============================================================================
// Agents
// ============================================================================

async fn list_agents(State(state): State<AppState>) -> Result<Json<Vec<Agent>>, AppError> {
    Ok(Json(state.agents.list().await?))
}

async fn get_agent(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Agent>, AppError> {
    Ok(Json(state.agents.get(id).await?))
}

async fn create_agent(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<NewAgent>,
) -> Result<(StatusCode, Json<Agent>), AppError> {
    let agent = state.agents.create(&actor, Agent::new(req)?).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

async fn toggle_agent(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Agent>, AppError> {
    Ok(Json(state.agents.toggle_status(&actor, id).await?))
}

async fn delete_agent(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.agents.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn pay_commission(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<CommissionPayment>,
) -> Result<Json<Agent>, AppError> {
    Ok(Json(state.agents.pay_commission(&actor, id, req.amount).await?))
}

// ============================================================================
// Airlines
// ============================================================================

async fn list_airlines(State(state): State<AppState>) -> Result<Json<Vec<Airline>>, AppError> {
    Ok(Json(state.airlines.list().await?))
}

async fn get_airline(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Airline>, AppError> {
    Ok(Json(state.airlines.get(id).await?))
}

async fn create_airline(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<NewAirline>,
) -> Result<(StatusCode, Json<Airline>), AppError> {
    let airline = state.airlines.create(&actor, Airline::new(req)?).await?;
    Ok((StatusCode::CREATED, Json(airline)))
}

async fn toggle_airline(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Airline>, AppError> {
    Ok(Json(state.airlines.toggle_status(&actor, id).await?))
}

async fn delete_airline(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.airlines.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Users
// ============================================================================

async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<SystemUser>>, AppError> {
    actor.require(Permission::ManageUsers)?;
    Ok(Json(state.users.list().await?))
}

async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<SystemUser>), AppError> {
    let user = state.users.create(&actor, SystemUser::new(req)?).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn toggle_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<SystemUser>, AppError> {
    Ok(Json(state.users.toggle_status(&actor, id).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.users.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{extract::State, routing::get, Extension, Json, Router};
use chrono::Utc;
use serde::Serialize;
use ticketpro_core::{Actor, Permission};
use ticketpro_inventory::TicketFilter;
use ticketpro_reports::{
    dashboard_summary, destination_sales, sales_periods, sales_report, DashboardSummary, DestinationSales,
    SalesReport,
};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
struct SalesResponse {
    #[serde(flatten)]
    report: SalesReport,
    destinations: Vec<DestinationSales>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reports/dashboard", get(dashboard))
        .route("/v1/reports/sales", get(sales))
}

async fn dashboard(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<DashboardSummary>, AppError> {
    actor.require(Permission::ViewReports)?;

    let tickets = state.desk.list(&TicketFilter::default()).await?;
    let payments = state.ledger.list(None).await?;
    let agents = state.agents.list().await?;
    let airlines = state.airlines.list().await?;
    let users = state.users.list().await?;

    Ok(Json(dashboard_summary(
        &tickets,
        &payments,
        &agents,
        &airlines,
        &users,
        Utc::now().date_naive(),
    )))
}

async fn sales(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<SalesResponse>, AppError> {
    actor.require(Permission::ViewReports)?;

    let bookings = state.bookings.list().await?;
    Ok(Json(SalesResponse {
        report: sales_report(sales_periods(&bookings)),
        destinations: destination_sales(&bookings),
    }))
}

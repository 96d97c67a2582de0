//! Aggregates recomputed from the current collections on every call.
//!
//! Nothing here is cached or stored: each function is a fold over the slice it
//! is given, and an empty slice yields zero for every total.

pub mod metrics;
pub mod sales;

pub use metrics::{
    agent_metrics, airline_metrics, batch_metrics, payment_metrics, ticket_metrics, user_metrics, AgentMetrics,
    AirlineMetrics, BatchMetrics, PaymentMetrics, TicketMetrics, UserMetrics,
};
pub use sales::{destination_sales, sales_periods, sales_report, DestinationSales, SalesPeriod, SalesReport};

use chrono::NaiveDate;
use serde::Serialize;
use ticketpro_directory::{Agent, Airline, SystemUser};
use ticketpro_inventory::Ticket;
use ticketpro_ledger::PaymentRecord;

/// Everything the dashboard cards show
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub tickets: TicketMetrics,
    pub payments: PaymentMetrics,
    pub agents: AgentMetrics,
    pub airlines: AirlineMetrics,
    pub users: UserMetrics,
}

pub fn dashboard_summary(
    tickets: &[Ticket],
    payments: &[PaymentRecord],
    agents: &[Agent],
    airlines: &[Airline],
    users: &[SystemUser],
    today: NaiveDate,
) -> DashboardSummary {
    DashboardSummary {
        tickets: ticket_metrics(tickets),
        payments: payment_metrics(payments, today),
        agents: agent_metrics(agents),
        airlines: airline_metrics(airlines),
        users: user_metrics(users),
    }
}

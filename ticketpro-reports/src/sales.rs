use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use ticketpro_inventory::BookingRecord;

/// One row of the sales report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesPeriod {
    pub period: String,
    pub revenue: i64,
    pub bookings: u64,
    pub customers: u64,
    /// Percent change in revenue from the previous period
    pub growth: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SalesReport {
    pub periods: Vec<SalesPeriod>,
    pub total_revenue: i64,
    pub total_bookings: u64,
    pub total_customers: u64,
    /// Mean of the per-period growth figures; 0 for an empty series
    pub average_growth: f64,
}

pub fn sales_report(periods: Vec<SalesPeriod>) -> SalesReport {
    let average_growth = if periods.is_empty() {
        0.0
    } else {
        periods.iter().map(|p| p.growth).sum::<f64>() / periods.len() as f64
    };
    SalesReport {
        total_revenue: periods.iter().map(|p| p.revenue).sum(),
        total_bookings: periods.iter().map(|p| p.bookings).sum(),
        total_customers: periods.iter().map(|p| p.customers).sum(),
        average_growth,
        periods,
    }
}

fn growth(previous: i64, current: i64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    let pct = (current - previous) as f64 / previous as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Monthly periods ("2024-01", ...) built from confirmed bookings, oldest first.
/// Customers are distinct passenger names within the month.
pub fn sales_periods(bookings: &[BookingRecord]) -> Vec<SalesPeriod> {
    let mut months: BTreeMap<(i32, u32), (i64, u64, HashSet<String>)> = BTreeMap::new();
    for booking in bookings.iter().filter(|b| b.is_confirmed()) {
        let key = (booking.created_at.year(), booking.created_at.month());
        let entry = months.entry(key).or_default();
        entry.0 += booking.total_amount;
        entry.1 += 1;
        entry.2.insert(booking.passenger_name.to_lowercase());
    }

    let mut previous = None;
    months
        .into_iter()
        .map(|((year, month), (revenue, count, customers))| {
            let period = SalesPeriod {
                period: format!("{}-{:02}", year, month),
                revenue,
                bookings: count,
                customers: customers.len() as u64,
                growth: previous.map_or(0.0, |prev| growth(prev, revenue)),
            };
            previous = Some(revenue);
            period
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DestinationSales {
    pub destination: String,
    pub bookings: u64,
    pub revenue: i64,
}

/// Confirmed sales per destination, highest revenue first
pub fn destination_sales(bookings: &[BookingRecord]) -> Vec<DestinationSales> {
    let mut by_destination: BTreeMap<&str, (u64, i64)> = BTreeMap::new();
    for booking in bookings.iter().filter(|b| b.is_confirmed()) {
        let entry = by_destination.entry(booking.destination.as_str()).or_default();
        entry.0 += 1;
        entry.1 += booking.total_amount;
    }

    let mut rows: Vec<DestinationSales> = by_destination
        .into_iter()
        .map(|(destination, (bookings, revenue))| DestinationSales {
            destination: destination.to_string(),
            bookings,
            revenue,
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows
}

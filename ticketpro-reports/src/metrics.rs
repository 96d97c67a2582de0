use chrono::NaiveDate;
use serde::Serialize;
use ticketpro_core::Role;
use ticketpro_directory::{Agent, Airline, SystemUser};
use ticketpro_inventory::{BatchStock, LockStatus, Ticket};
use ticketpro_ledger::{PaymentRecord, PaymentStatus};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TicketMetrics {
    pub total: usize,
    pub available: usize,
    pub locked: usize,
    pub sold: usize,
    pub confirmed: usize,
    /// Sum of price over sold tickets
    pub revenue: i64,
    /// Sum of buying price over sold tickets
    pub cost: i64,
    pub profit: i64,
}

pub fn ticket_metrics(tickets: &[Ticket]) -> TicketMetrics {
    let mut m = TicketMetrics {
        total: tickets.len(),
        ..Default::default()
    };
    for ticket in tickets {
        match ticket.lock_status {
            LockStatus::Available => m.available += 1,
            LockStatus::Locked => m.locked += 1,
            LockStatus::Sold => {
                m.sold += 1;
                m.revenue += ticket.price;
                m.cost += ticket.buying_price;
            }
        }
        if ticket.is_confirmed {
            m.confirmed += 1;
        }
    }
    m.profit = m.revenue - m.cost;
    m
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PaymentMetrics {
    pub total_received: i64,
    pub total_pending: i64,
    pub full_count: usize,
    pub partial_count: usize,
    pub pending_count: usize,
    pub overdue_count: usize,
}

pub fn payment_metrics(records: &[PaymentRecord], today: NaiveDate) -> PaymentMetrics {
    let mut m = PaymentMetrics::default();
    for record in records {
        m.total_received += record.paid_amount;
        m.total_pending += record.remaining_amount;
        match record.payment_status {
            PaymentStatus::Full => m.full_count += 1,
            PaymentStatus::Partial => m.partial_count += 1,
            PaymentStatus::Pending => m.pending_count += 1,
        }
        if record.is_overdue(today) {
            m.overdue_count += 1;
        }
    }
    m
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AgentMetrics {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub total_bookings: u64,
    pub total_revenue: i64,
    pub commission_earned: i64,
    pub commission_paid: i64,
    pub commission_pending: i64,
}

pub fn agent_metrics(agents: &[Agent]) -> AgentMetrics {
    let active = agents.iter().filter(|a| a.status.is_active()).count();
    AgentMetrics {
        total: agents.len(),
        active,
        inactive: agents.len() - active,
        total_bookings: agents.iter().map(|a| u64::from(a.total_bookings)).sum(),
        total_revenue: agents.iter().map(|a| a.total_revenue).sum(),
        commission_earned: agents.iter().map(|a| a.commission_earned).sum(),
        commission_paid: agents.iter().map(|a| a.commission_paid).sum(),
        commission_pending: agents.iter().map(|a| a.commission_pending).sum(),
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AirlineMetrics {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub total_revenue: i64,
    pub active_tickets: u64,
    pub total_routes: u64,
}

pub fn airline_metrics(airlines: &[Airline]) -> AirlineMetrics {
    let active = airlines.iter().filter(|a| a.status.is_active()).count();
    AirlineMetrics {
        total: airlines.len(),
        active,
        inactive: airlines.len() - active,
        total_revenue: airlines.iter().map(|a| a.total_revenue).sum(),
        active_tickets: airlines.iter().map(|a| u64::from(a.active_tickets)).sum(),
        total_routes: airlines.iter().map(|a| u64::from(a.total_routes)).sum(),
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UserMetrics {
    pub total: usize,
    pub active: usize,
    pub admins: usize,
    pub managers: usize,
    pub staff: usize,
}

pub fn user_metrics(users: &[SystemUser]) -> UserMetrics {
    let count_role = |role: Role| users.iter().filter(|u| u.role == role).count();
    UserMetrics {
        total: users.len(),
        active: users.iter().filter(|u| u.status.is_active()).count(),
        admins: count_role(Role::Admin),
        managers: count_role(Role::Manager),
        staff: count_role(Role::Staff),
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BatchMetrics {
    pub total_batches: usize,
    pub total_cost: i64,
    pub sold: u64,
    pub available: u64,
    pub locked: u64,
    pub total_profit: i64,
}

pub fn batch_metrics(batches: &[BatchStock]) -> BatchMetrics {
    BatchMetrics {
        total_batches: batches.len(),
        total_cost: batches.iter().map(|b| b.batch.total_cost).sum(),
        sold: batches.iter().map(|b| u64::from(b.sold_count)).sum(),
        available: batches.iter().map(|b| u64::from(b.available_count)).sum(),
        locked: batches.iter().map(|b| u64::from(b.locked_count)).sum(),
        total_profit: batches.iter().map(|b| b.total_profit).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};
    use ticketpro_directory::{ActiveStatus, NewAgent, NewAirline, NewUser};
    use ticketpro_ledger::PaymentApplication;
    use uuid::Uuid;

    fn ticket(serial: &str, price: i64, status: LockStatus) -> Ticket {
        let mut t = Ticket::new(
            serial,
            "Singapore Airlines",
            "Singapore",
            NaiveDate::from_ymd_opt(2024, 2, 19).unwrap(),
            NaiveTime::from_hms_opt(13, 20, 0).unwrap(),
            price,
            price - 4000,
        );
        t.lock_status = status;
        t.is_confirmed = status == LockStatus::Sold;
        t
    }

    fn payment(total: i64, paid: i64) -> PaymentRecord {
        let mut record = PaymentRecord {
            id: Uuid::new_v4(),
            ticket_no: "BD004".to_string(),
            passenger_name: "Mohammad Ali".to_string(),
            destination: "Singapore".to_string(),
            total_amount: total,
            paid_amount: 0,
            remaining_amount: total,
            payment_status: PaymentStatus::Pending,
            payment_method: "Not specified".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 22),
            last_payment: None,
            agent_name: "Dhaka Express Travel".to_string(),
            notes: String::new(),
            created_at: Utc::now(),
        };
        if paid > 0 {
            record.apply(&PaymentApplication::new(paid)).unwrap();
        }
        record
    }

    #[test]
    fn test_empty_collections_are_zero() {
        let today = Utc::now().date_naive();
        assert_eq!(ticket_metrics(&[]), TicketMetrics::default());
        assert_eq!(payment_metrics(&[], today), PaymentMetrics::default());
        assert_eq!(agent_metrics(&[]), AgentMetrics::default());
        assert_eq!(airline_metrics(&[]), AirlineMetrics::default());
        assert_eq!(user_metrics(&[]), UserMetrics::default());
        assert_eq!(batch_metrics(&[]), BatchMetrics::default());
    }

    #[test]
    fn test_ticket_counts_and_profit() {
        let tickets = vec![
            ticket("BD001", 45000, LockStatus::Available),
            ticket("BD002", 48000, LockStatus::Locked),
            ticket("BD003", 46500, LockStatus::Sold),
            ticket("BD004", 52000, LockStatus::Sold),
        ];
        let m = ticket_metrics(&tickets);
        assert_eq!((m.available, m.locked, m.sold, m.confirmed), (1, 1, 2, 2));
        assert_eq!(m.revenue, 98500);
        assert_eq!(m.cost, 90500);
        assert_eq!(m.profit, 8000);
    }

    #[test]
    fn test_payment_totals_match_records() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let records = vec![payment(45000, 45000), payment(48000, 25000), payment(46500, 0)];
        let m = payment_metrics(&records, today);

        assert_eq!(m.total_received, records.iter().map(|r| r.paid_amount).sum::<i64>());
        assert_eq!(m.total_received, 70000);
        assert_eq!(m.total_pending, 69500);
        assert_eq!((m.full_count, m.partial_count, m.pending_count), (1, 1, 1));
        assert_eq!(m.overdue_count, 1);
    }

    #[test]
    fn test_directory_metrics() {
        let mut agents: Vec<Agent> = ["Dhaka Express Travel", "Sylhet Sky Tours"]
            .iter()
            .map(|name| {
                Agent::new(NewAgent {
                    name: name.to_string(),
                    company: String::new(),
                    email: String::new(),
                    phone: String::new(),
                    address: String::new(),
                    city: String::new(),
                    country: "Bangladesh".to_string(),
                    commission: 5.0,
                })
                .unwrap()
            })
            .collect();
        agents[0].record_booking(100000, Utc::now().date_naive());
        agents[0].pay_commission(2000).unwrap();
        agents[1].status = ActiveStatus::Inactive;

        let m = agent_metrics(&agents);
        assert_eq!((m.total, m.active, m.inactive), (2, 1, 1));
        assert_eq!(m.total_bookings, 1);
        assert_eq!(m.commission_earned, 5000);
        assert_eq!(m.commission_paid, 2000);
        assert_eq!(m.commission_pending, 3000);

        let mut airline = Airline::new(NewAirline {
            name: "Emirates".to_string(),
            code: "EK".to_string(),
            country: "UAE".to_string(),
            logo: String::new(),
            commission: 8.5,
            contact_email: String::new(),
            contact_phone: String::new(),
        })
        .unwrap();
        airline.total_routes = 12;
        airline.active_tickets = 45;
        let m = airline_metrics(&[airline]);
        assert_eq!((m.total, m.active, m.total_routes, m.active_tickets), (1, 1, 12, 45));

        let users: Vec<SystemUser> = [Role::Admin, Role::Staff, Role::Staff]
            .into_iter()
            .enumerate()
            .map(|(i, role)| {
                SystemUser::new(NewUser {
                    name: format!("User {}", i),
                    email: format!("user{}@bdticketpro.com", i),
                    role,
                    phone: String::new(),
                })
                .unwrap()
            })
            .collect();
        let m = user_metrics(&users);
        assert_eq!((m.total, m.active, m.admins, m.managers, m.staff), (3, 3, 1, 0, 2));
    }
}

pub mod tickets;

pub use tickets::{ServiceError, TicketService};

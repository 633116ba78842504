pub mod bookings;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod extract;
pub mod hotels;
pub mod rooms;
pub mod routes;
pub mod users;

pub use routes::{build_router, AppState};

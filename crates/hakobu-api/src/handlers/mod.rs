pub mod assignments;
pub mod auth;
pub mod deliveries;
pub mod extraction;
pub mod uploads;
pub mod users;

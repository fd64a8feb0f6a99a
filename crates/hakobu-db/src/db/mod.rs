pub mod assignments;
pub mod deliveries;
pub mod uploads;
pub mod users;

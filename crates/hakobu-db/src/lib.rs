//! Hakobu Database Library
//!
//! sqlx/Postgres repositories, one per aggregate. Repositories return core
//! domain models and `AppError`; SQL lives here and nowhere else.

mod db;

pub use db::assignments::AssignmentRepository;
pub use db::deliveries::DeliveryRequestRepository;
pub use db::uploads::FileUploadRepository;
pub use db::users::{DriverProfileRepository, UserRepository};

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod sla;

pub use repository::PgCaseRepository;
pub use services::CaseService;

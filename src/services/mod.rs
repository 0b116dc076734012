pub mod assistant;
pub use assistant::{AssistantDomain, AssistantService};

pub mod auth_service;
pub use auth_service::{AuthError, AuthService, UserInfo};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod credentials;

pub mod dashboard;
pub use dashboard::{DashboardService, DashboardSummary};

pub mod import;
pub use import::{CsvImporter, ImportReport, ImportSummary};

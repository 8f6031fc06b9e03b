pub mod audit_logs;
pub mod profiles;
pub mod reviews;
pub mod service_requests;
pub mod users;
pub mod workshops;

pub use audit_logs::Entity as AuditLogs;
pub use profiles::Entity as Profiles;
pub use reviews::Entity as Reviews;
pub use service_requests::Entity as ServiceRequests;
pub use users::Entity as Users;
pub use workshops::Entity as Workshops;

pub mod auth;
pub mod gate;

pub use auth::{Authentication, Credentials};
pub use gate::RoleGate;

pub mod auth_service;
pub mod auth_service_impl;

pub mod notifier;

pub mod reset_service;
pub mod reset_service_impl;

pub use auth_service::{AuthError, AuthService, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;
pub use notifier::{Notifier, NotifyError, SmtpNotifier};
pub use reset_service::{IssuedReset, ResetError, ResetService};
pub use reset_service_impl::SeaOrmResetService;

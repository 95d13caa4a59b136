pub mod alumni;
pub mod event;
pub mod mentorship;
pub mod reset_token;
pub mod user;

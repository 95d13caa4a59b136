pub mod prelude;

pub mod alumni;
pub mod events;
pub mod mentor_applications;
pub mod mentorships;
pub mod pw_reset_tokens;
pub mod users;

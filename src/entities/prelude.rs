pub use super::alumni::Entity as Alumni;
pub use super::events::Entity as Events;
pub use super::mentor_applications::Entity as MentorApplications;
pub use super::mentorships::Entity as Mentorships;
pub use super::pw_reset_tokens::Entity as PwResetTokens;
pub use super::users::Entity as Users;

pub use super::games::Entity as Games;
pub use super::stats::Entity as Stats;
pub use super::users::Entity as Users;

pub mod prelude;

pub mod games;
pub mod stats;
pub mod users;

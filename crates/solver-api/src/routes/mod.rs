pub mod health;
pub mod messages;
pub mod threads;
pub mod turns;

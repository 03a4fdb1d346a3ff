pub mod admin;
pub mod articles;
pub mod briefings;
pub mod narratives;
pub mod signals;

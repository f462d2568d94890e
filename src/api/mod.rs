pub mod client;
pub mod models;

pub use client::{LimitlessClient, LIFELOGS_PATH};
pub use models::{Direction, LifelogQuery};

pub mod health;
pub mod jobs;
pub mod news;
pub mod preferences;

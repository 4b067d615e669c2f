pub mod activity_log;
pub mod refresh_token;
pub mod user;

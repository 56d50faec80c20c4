pub mod auth;
pub mod forms;
pub mod jobs;
pub mod poster;
pub mod probes;
pub mod questions;
pub mod review;
pub mod submit;
pub mod unsubscribe;

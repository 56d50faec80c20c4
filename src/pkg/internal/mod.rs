pub mod adaptors;
pub mod association;
pub mod auth;
pub mod email;
pub mod lookup;
pub mod minio;
pub mod questions;

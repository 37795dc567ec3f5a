pub mod admin;
pub mod api;
pub mod attachments;
pub mod auth;
pub mod config;
pub mod drafts;
pub mod logging;
pub mod manage_contacts;
pub mod records;
pub mod security;
pub mod services;

//! Route handlers for the travel blogging API.

pub mod admin;
pub mod auth;
pub mod chatbot;
pub mod contact;
pub mod health;
pub mod posts;
pub mod root;
pub mod users;

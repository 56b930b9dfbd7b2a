//! Personal notes with a paginated feed and an AI chat assistant.
//!
//! Stores, the completion gateway and the chat history are all trait
//! handles, constructed once by the binary and passed into the components
//! that use them.

pub mod app;
pub mod chat;
pub mod config;
pub mod dto;
pub mod feed;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

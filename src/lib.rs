//! Failover query client for a simulated key-value server.
//!
//! A [`connection::ConnectionSupervisor`] links to a primary or backup
//! server, a [`query::QueryDispatcher`] runs query batches concurrently over
//! that link, and a [`store::CommandProcessor`] applies each query to the
//! server's [`store::Store`].

pub mod config;
pub mod connection;
pub mod logging;
pub mod query;
pub mod store;

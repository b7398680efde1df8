//! Request admission gate in front of an external identity provider.
//!
//! Every request is classified against an ordered rule set, the caller's
//! session is resolved from the provider's session store, and the gate
//! answers Continue, Redirect or Reject.
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod services;
pub mod state;

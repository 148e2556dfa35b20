//! Types shared between the family-contracts client and anything else that
//! speaks the backend's REST dialect.

pub mod api;
pub mod auth;
pub mod domain;
pub mod jwt;
pub mod storage;

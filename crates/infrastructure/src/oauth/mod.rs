//! `OAuth2` authorization-code plumbing.

mod client;

pub use client::{OAuthClient, OAuthEndpoints};

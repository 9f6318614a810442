//! Multi-chain ERC-20/BEP-20 transfer monitor
//!
//! Polls explorer APIs for recent token transfers, values them in USD,
//! classifies them as exchange deposits or whale transfers and posts
//! alerts to a chat webhook. Each transfer is alerted at most once.

pub mod config;
pub mod error;
pub mod persistence;
pub mod pipeline;

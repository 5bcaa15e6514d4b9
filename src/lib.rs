//! vacation-mailer — out-of-office autoresponder core.
//!
//! On a fixed interval, one cycle runs four sequential stages:
//! fetch recent unread messages, resolve each message to its sender,
//! filter senders down to first-time correspondents, then send one
//! canned reply per correspondent and relabel their messages so no
//! later cycle touches them again.

pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod pipeline;
pub mod poller;

#![doc = "webotron-core: core logic library for webotron."]

//! This crate contains the storage-agnostic logic of webotron: the bucket
//! provisioner, the directory synchroniser and the contracts they run against.
//! The AWS client lives in the CLI crate.
//!
//! # Usage
//! Implement [`contract::StorageClient`] for a backend, then call
//! [`provision::ensure_bucket`] or [`synchronise::sync`] with it.

pub mod config;
pub mod contract;
pub mod provision;
pub mod synchronise;
pub mod tree;

#![doc = "play-release-core: the Google Play release sequence, independent of transport and credentials."]

//! This crate holds the data model, the [`contract::Publisher`] trait and the
//! five-step release sequence in [`release`]. Network and authentication code
//! lives in the `play-release` CLI crate, which provides the HTTP publisher.
//!
//! # Usage
//! Build a [`config::ReleaseConfig`], pick a `Publisher` implementation and
//! call [`release::release`].

pub mod config;
pub mod contract;
pub mod release;

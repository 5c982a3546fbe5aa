//! # Dockforge Library
//!
//! This library provides the core functionality for synthesizing
//! per-application configuration for a multi-service container
//! deployment. It is designed to be used by the `dockforge` command-line
//! tool but can also be integrated into other applications that manage a
//! template-driven compose setup.
//!
//! ## Quick Example
//!
//! ```no_run
//! use dockforge::layout::Layout;
//! use dockforge::{apps, synth};
//!
//! let layout = Layout::discover().unwrap();
//!
//! // Enable an application and bring every derived file up to date.
//! apps::enable(&layout, &["SONARR".to_string()]).unwrap();
//! synth::appvars::create_all(&layout, false).unwrap();
//!
//! // Synthesize the merged manifest for everything enabled.
//! synth::manifest::generate(&layout, false).unwrap();
//! ```
//!
//! ## Core Concepts
//!
//! The library is built around a few key concepts:
//!
//! - **Variable Store (`vars`)**: quote- and comment-aware reading and
//!   writing of flat `KEY=VALUE` files, preserving everything it does not
//!   understand.
//! - **Naming (`naming`)**: the single classification rule mapping
//!   variable keys to their owning application (or the global scope).
//! - **Instance Templater (`template`)**: materializes per-instance
//!   copies of templates, with byte-exact snapshots used to detect
//!   template changes.
//! - **Merge Engine (`merge`)**: copies newly-introduced template
//!   variables into live files without ever overwriting user edits.
//! - **Staleness Tracker (`staleness`)**: fingerprints tracked files so
//!   expensive regeneration only runs when something relevant changed.
//! - **Formatter (`format`)**: rewrites variable files into canonical
//!   form with headers and a template backbone.
//! - **Fragment Selector (`fragments`)**: picks the ordered manifest
//!   fragment list per enabled application and drives the external merge
//!   command.
//!
//! ## Execution Flow
//!
//! The `synth` module chains these into an ordered pipeline:
//!
//! 1.  **Bootstrap**: create and sanitize the live env file.
//! 2.  **App variables**: instantiate templates and merge new variables
//!     for every added application.
//! 3.  **Update**: rewrite the live files into canonical form.
//! 4.  **Manifest**: select fragments and invoke the external merge.
//!
//! Every stage records staleness markers on success, so re-running the
//! pipeline with nothing changed is close to free.

pub mod apps;
pub mod defaults;
pub mod error;
pub mod format;
pub mod fragments;
pub mod labels;
pub mod layout;
pub mod merge;
pub mod migrate;
pub mod naming;
pub mod output;
pub mod staleness;
pub mod suggestions;
pub mod synth;
pub mod template;
pub mod vars;

#[cfg(test)]
mod naming_proptest;

//! The configuration synthesis pipeline.
//!
//! ## Overview
//!
//! Synthesis runs as an ordered pipeline of stages, each with an explicit
//! input/output contract:
//!
//! 1. **Bootstrap** - create the compose directory and the live env file,
//!    merge missing defaults, recompute platform-derived globals.
//! 2. **App variables** - for every added application, instantiate its
//!    templates and merge newly-introduced variables into the live files,
//!    gated by the staleness tracker.
//! 3. **Update** - rewrite the live env files into canonical form
//!    (headers, backbone ordering, user-defined sections).
//! 4. **Manifest** - select the ordered fragment list for the enabled
//!    applications and hand it to the external merge command.
//!
//! Stages depend only on earlier stages and the foundation modules
//! (`vars`, `naming`, `template`, `merge`, `staleness`, `format`,
//! `fragments`). Each stage records fresh staleness markers after a
//! successful run, so a following invocation with nothing changed is
//! close to free.

pub mod appvars;
pub mod bootstrap;
pub mod manifest;
pub mod update;

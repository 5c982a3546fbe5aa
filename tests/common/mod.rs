//! Shared test utilities for CLI E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_app("sonarr");
//!     fixture.command().args(["enable", "SONARR"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    pub use super::TestFixture;
}

/// A test fixture providing an isolated dockforge root.
///
/// The fixture wires the `DOCKFORGE_*` environment overrides so every
/// spawned command sees its own compose, config, and state directories,
/// and replaces the external manifest-merge command with `cat` so tests
/// run without a container engine.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new fixture with an empty root.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a template directory for a base app with main and arch
    /// fragments, ready for manifest synthesis.
    pub fn with_app(self, base: &str) -> Self {
        let arch = std::env::consts::ARCH;
        self.with_template_file(base, &format!("{base}.yml"), &format!("# {base} main\n"))
            .with_template_file(
                base,
                &format!("{base}.{arch}.yml"),
                &format!("# {base} arch\n"),
            )
    }

    /// Add one file under a base app's template directory.
    pub fn with_template_file(self, base: &str, name: &str, content: &str) -> Self {
        self.temp_dir
            .child(format!("state/templates/apps/{base}/{name}"))
            .write_str(content)
            .expect("Failed to write template file");
        self
    }

    /// Add a file under the compose directory.
    #[allow(dead_code)]
    pub fn with_compose_file(self, name: &str, content: &str) -> Self {
        self.temp_dir
            .child(format!("compose/{name}"))
            .write_str(content)
            .expect("Failed to write compose file");
        self
    }

    /// Path to the fixture root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path to the live env file.
    pub fn env_file(&self) -> PathBuf {
        self.path().join("compose/.env")
    }

    /// Path to an app-specific env file.
    #[allow(dead_code)]
    pub fn app_env_file(&self, app: &str) -> PathBuf {
        self.path()
            .join(format!("compose/.env.app.{}", app.to_lowercase()))
    }

    /// Path to the synthesized manifest.
    pub fn manifest_file(&self) -> PathBuf {
        self.path().join("compose/docker-compose.yml")
    }

    /// Create a command wired to this fixture's directories.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("dockforge").expect("binary builds");
        cmd.env("DOCKFORGE_COMPOSE_DIR", self.path().join("compose"))
            .env("DOCKFORGE_CONFIG_DIR", self.path().join("config"))
            .env("DOCKFORGE_STATE_DIR", self.path().join("state"))
            .env("DOCKFORGE_MERGE_CMD", "cat");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

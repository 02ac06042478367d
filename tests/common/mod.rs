//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a scientific-stack workspace fixture (a build
//! feature, a test feature, two BLAS flavours, CUDA, and a Windows-only
//! feature) plus helpers to write it to disk and run the binary against it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_workspace(workspaces::SCIENTIFIC);
//!     fixture.command().args(["resolve", "default"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

use envcompose::config::{parse_yaml, Workspace};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{scientific_workspace, workspaces, TestFixture};
}

/// Workspace files used across tests.
#[allow(dead_code)]
pub mod workspaces {
    /// A build/test workspace with alternative BLAS implementations and a
    /// GPU feature.
    pub const SCIENTIFIC: &str = r#"
platforms: [linux-64, osx-arm64, win-64]
features:
  - name: build
    dependencies:
      python: ">=3.10"
      numpy: ">=1.23"
      meson-python: ">=0.15"
    target-dependencies:
      linux-64:
        gcc: ">=12"
    activation-env:
      BUILD_DIR: build
    tasks:
      build:
        cmd: meson compile -C $BUILD_DIR
        description: Compile the extension modules
      wheel:
        cmd: python -m build --wheel
        depends-on: [build]
        env:
          PIP_NO_BUILD_ISOLATION: "1"
  - name: test
    dependencies:
      numpy: "<2.3"
      pytest: "*"
    tasks:
      test:
        cmd: pytest
        depends-on: [wheel]
        env:
          PYTHONPATH: "${BUILD_DIR}/install:${PYTHONPATH:-}"
  - name: openblas
    dependencies:
      libblas: "@*openblas"
  - name: mkl
    platforms: [linux-64, win-64]
    dependencies:
      libblas: "@*mkl"
  - name: cuda
    platforms: [linux-64]
    system-requirements:
      cuda: "12.0"
    dependencies:
      cupy: ">=13"
  - name: windows
    platforms: [win-64]
environments:
  - name: default
    features: [build, test, openblas]
    solve-group: main
  - name: mkl
    features: [build, test, mkl]
  - name: conflicting-blas
    features: [build, openblas, mkl]
  - name: gpu
    features: [build, cuda]
    solve-group: main
  - name: gpu-windows
    features: [cuda, windows]
  - name: broken
    features: [build, fortran]
"#;

    /// The smallest workspace that resolves.
    pub const MINIMAL: &str = r#"
features:
  - name: build
    tasks:
      build:
        cmd: make
environments:
  - name: dev
    features: [build]
"#;

    /// Not a workspace at all.
    pub const INVALID_YAML: &str = "features: [unclosed";
}

/// Parses and loads [`workspaces::SCIENTIFIC`].
#[allow(dead_code)]
pub fn scientific_workspace() -> Workspace {
    let model = parse_yaml(workspaces::SCIENTIFIC).expect("fixture parses");
    Workspace::from_model(model).expect("fixture loads")
}

/// A temporary directory holding a workspace file.
#[allow(dead_code)]
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Writes `envcompose.yaml` with the given content.
    pub fn with_workspace(self, content: &str) -> Self {
        self.with_file("envcompose.yaml", content)
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn manifest_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("envcompose.yaml")
    }

    /// A command running in the fixture directory with color and the
    /// manifest variable cleared.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("envcompose");
        cmd.current_dir(self.path())
            .env_remove("ENVCOMPOSE_MANIFEST")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

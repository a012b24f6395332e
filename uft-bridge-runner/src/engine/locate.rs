// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    config::{CiEnvironment, EngineConfig, EngineLocation},
    errors::EngineLocateError,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fs, io};
use tracing::debug;

/// Composes the path to the engine binary without touching the filesystem.
///
/// In [`EngineLocation::WorkingDir`] mode the binary is looked up relative to the workspace root.
/// In [`EngineLocation::CiAction`] mode it is looked up relative to the directory the CI action
/// was checked out to, which requires the runner workspace, action repository and action
/// reference to all be present in `env`.
pub fn engine_path(
    config: &EngineConfig,
    workspace_root: &Utf8Path,
    env: &CiEnvironment,
) -> Result<Utf8PathBuf, EngineLocateError> {
    let base = match config.location() {
        EngineLocation::WorkingDir => workspace_root.to_owned(),
        EngineLocation::CiAction => env.action_location()?.action_dir(),
    };
    Ok(base.join(config.relative_path()))
}

/// Composes the path to the engine binary, and verifies that it exists and can be executed.
pub fn resolve_engine_binary(
    config: &EngineConfig,
    workspace_root: &Utf8Path,
    env: &CiEnvironment,
) -> Result<Utf8PathBuf, EngineLocateError> {
    let path = engine_path(config, workspace_root, env)?;
    verify_executable(&path)?;
    debug!(location = %config.location(), "located engine binary at {path}");
    Ok(path)
}

fn verify_executable(path: &Utf8Path) -> Result<(), EngineLocateError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(EngineLocateError::NotFound {
                path: path.to_owned(),
            });
        }
        Err(error) => {
            return Err(EngineLocateError::Metadata {
                path: path.to_owned(),
                error,
            });
        }
    };

    if !metadata.is_file() {
        return Err(EngineLocateError::NotAFile {
            path: path.to_owned(),
        });
    }

    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            use std::os::unix::fs::PermissionsExt;

            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(EngineLocateError::NotExecutable {
                    path: path.to_owned(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EnvironmentError;
    use camino_tempfile::tempdir;
    use camino_tempfile_ext::prelude::*;

    #[test]
    fn working_dir_path() {
        let config = EngineConfig::new("launcher/FTToolsLauncher.exe", EngineLocation::WorkingDir);
        let path = engine_path(&config, Utf8Path::new("/repo"), &CiEnvironment::default()).unwrap();
        assert_eq!(path, "/repo/launcher/FTToolsLauncher.exe");
    }

    #[test]
    fn ci_action_path() {
        let config = EngineConfig::new("bin/launcher", EngineLocation::CiAction);
        let env = CiEnvironment::from_vars([
            ("RUNNER_WORKSPACE", "/home/runner/work"),
            ("GITHUB_ACTION_REPOSITORY", "acme/uft-action"),
            ("GITHUB_ACTION_REF", "v2.1.0"),
        ]);
        let path = engine_path(&config, Utf8Path::new("/ignored"), &env).unwrap();
        assert_eq!(
            path,
            "/home/runner/work/_actions/acme/uft-action/v2.1.0/bin/launcher"
        );
    }

    #[test]
    fn ci_action_names_missing_variable() {
        let config = EngineConfig::new("bin/launcher", EngineLocation::CiAction);
        let env = CiEnvironment::from_vars([
            ("RUNNER_WORKSPACE", "/home/runner/work"),
            ("GITHUB_ACTION_REF", "v2.1.0"),
        ]);
        let error = resolve_engine_binary(&config, Utf8Path::new("/repo"), &env).unwrap_err();
        assert!(matches!(
            error,
            EngineLocateError::Environment(EnvironmentError::Missing {
                name: "GITHUB_ACTION_REPOSITORY"
            })
        ));
    }

    #[test]
    fn missing_binary_is_not_found() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::new("launcher", EngineLocation::WorkingDir);
        let error =
            resolve_engine_binary(&config, dir.path(), &CiEnvironment::default()).unwrap_err();
        assert!(matches!(error, EngineLocateError::NotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("launcher")).unwrap();
        let config = EngineConfig::new("launcher", EngineLocation::WorkingDir);
        let error =
            resolve_engine_binary(&config, dir.path(), &CiEnvironment::default()).unwrap_err();
        assert!(matches!(error, EngineLocateError::NotAFile { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_is_required() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let launcher = dir.child("launcher");
        launcher.write_str("#!/bin/sh\n").unwrap();
        let config = EngineConfig::new("launcher", EngineLocation::WorkingDir);

        fs::set_permissions(launcher.as_path(), fs::Permissions::from_mode(0o644)).unwrap();
        let error =
            resolve_engine_binary(&config, dir.path(), &CiEnvironment::default()).unwrap_err();
        assert!(matches!(error, EngineLocateError::NotExecutable { .. }));

        fs::set_permissions(launcher.as_path(), fs::Permissions::from_mode(0o755)).unwrap();
        let path = resolve_engine_binary(&config, dir.path(), &CiEnvironment::default()).unwrap();
        assert_eq!(path, launcher.as_path());
    }
}

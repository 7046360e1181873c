//! Zip extraction into a staging directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::install::error::ProvisionError;

/// Extract `archive` into `dest` and return the path of `binary_name` inside it
///
/// Entries whose names would escape `dest` are skipped. The binary must sit
/// at the archive root; it is made executable on Unix.
pub fn extract_binary(
    archive: &Path,
    dest: &Path,
    binary_name: &str,
) -> Result<PathBuf, ProvisionError> {
    extract_zip(archive, dest)?;

    let binary = dest.join(binary_name);
    if !binary.is_file() {
        return Err(ProvisionError::BinaryNotFound {
            name: binary_name.to_string(),
        });
    }

    #[cfg(unix)]
    set_executable_permissions(&binary)?;

    Ok(binary)
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), ProvisionError> {
    let extraction_failed = |reason: String| ProvisionError::Extraction {
        archive: archive_path.to_path_buf(),
        reason,
    };

    let file = fs::File::open(archive_path)
        .map_err(|e| ProvisionError::io(format!("open archive {}", archive_path.display()), e))?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| extraction_failed(e.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| extraction_failed(e.to_string()))?;

        let Some(relative) = entry.enclosed_name() else {
            debug!("Skipping unsafe archive entry {:?}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| {
                ProvisionError::io(format!("create directory {}", out_path.display()), e)
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ProvisionError::io(format!("create directory {}", parent.display()), e)
            })?;
        }

        let mut out_file = fs::File::create(&out_path)
            .map_err(|e| ProvisionError::io(format!("create file {}", out_path.display()), e))?;
        io::copy(&mut entry, &mut out_file)
            .map_err(|e| extraction_failed(format!("{}: {}", out_path.display(), e)))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o777)).map_err(
                |e| ProvisionError::io(format!("set permissions for {}", out_path.display()), e),
            )?;
        }
    }

    Ok(())
}

/// Sets executable permissions on Unix
#[cfg(unix)]
fn set_executable_permissions(path: &Path) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .map_err(|e| ProvisionError::io(format!("get metadata for {}", path.display()), e))?
        .permissions();

    // Add executable bit (owner, group, other)
    permissions.set_mode(permissions.mode() | 0o111);

    fs::set_permissions(path, permissions)
        .map_err(|e| ProvisionError::io(format!("set permissions for {}", path.display()), e))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    /// Build an in-memory zip from `(name, content, unix mode)` entries
    pub fn build_zip(entries: &[(&str, &str, u32)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content, mode) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default().unix_permissions(*mode))
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

//! Package operations for DDS node packages
//!
//! A package is a directory in the repository with a fixed layout:
//!
//! ```text
//! <package_name>/
//!     build/        build artifacts and final binary
//!     src/          sources
//!     include/      headers
//!     config/       node configs and params
//!     launch/       launch files
//!     CMakeLists.txt
//!     README.md
//! ```
//!
//! Every package on disk has a matching entry in `node_registry.json`. The
//! operations here keep the two in step: when the second half of an
//! operation fails, the first half is undone.

use chrono::{DateTime, Local};
use dds_core::registry::validate_package_name;
use dds_core::{Error, NodeRegistry, RegistryEntry, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Directories created inside every package
pub const PACKAGE_DIRS: [&str; 5] = ["build", "src", "include", "config", "launch"];

/// Files created (empty) inside every package
pub const PACKAGE_FILES: [&str; 2] = ["CMakeLists.txt", "README.md"];

/// Name and absolute location of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePaths {
    pub name: String,
    pub abs_path: PathBuf,
}

impl PackagePaths {
    /// Package `name` inside `cwd`
    pub fn new(cwd: &Path, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_package_name(&name)?;
        let abs_path = cwd.join(&name);
        Ok(Self { name, abs_path })
    }
}

/// What `inspect_package` reports before a delete
#[derive(Debug, Clone)]
pub struct PackageInfo {
    /// Location relative to the repository root
    pub location: String,
    /// Total size of all files, in bytes
    pub size_bytes: u64,
    /// Creation time, or last modification where the filesystem has none
    pub created: Option<DateTime<Local>>,
}

/// Path of `path` relative to the registry's repository root
///
/// Both sides are canonicalized first. `path` itself may not exist yet (a
/// package about to be created), in which case its parent must.
async fn relative_to_root(registry: &NodeRegistry, path: &Path) -> Result<String> {
    let root = fs::canonicalize(registry.repo_root()).await?;
    let target = match fs::canonicalize(path).await {
        Ok(target) => target,
        Err(_) => {
            let (parent, name) = path.parent().zip(path.file_name()).ok_or_else(|| {
                Error::invalid_input(format!("{} has no parent directory", path.display()))
            })?;
            fs::canonicalize(parent).await?.join(name)
        }
    };

    target
        .strip_prefix(&root)
        .map(|rel| rel.to_string_lossy().into_owned())
        .map_err(|_| {
            Error::invalid_input(format!(
                "{} is not within the repository at {}",
                path.display(),
                root.display()
            ))
        })
}

/// Create the package layout and register it
///
/// Fails if the directory already exists or the name is already registered.
/// If registration fails the new directory is removed again.
pub async fn create_package(
    registry: &mut NodeRegistry,
    paths: &PackagePaths,
) -> Result<RegistryEntry> {
    if fs::try_exists(&paths.abs_path).await? {
        let location = relative_to_root(registry, &paths.abs_path)
            .await
            .unwrap_or_else(|_| paths.abs_path.display().to_string());
        return Err(Error::already_exists(format!(
            "Package: {} already exists at '{}'",
            paths.name, location
        )));
    }
    if let Some(entry) = registry.find(&paths.name) {
        return Err(Error::already_exists(format!(
            "Package: {} already exists at '{}'",
            paths.name, entry.path
        )));
    }

    let rel_path = relative_to_root(registry, &paths.abs_path).await?;

    for dir in PACKAGE_DIRS {
        fs::create_dir_all(paths.abs_path.join(dir)).await?;
    }
    for file in PACKAGE_FILES {
        fs::File::create(paths.abs_path.join(file)).await?;
    }
    debug!("Created layout for {} at {}", paths.name, paths.abs_path.display());

    let entry = RegistryEntry::new(&paths.name, rel_path);
    let registered = match registry.register(entry.clone()) {
        Ok(()) => registry.save().await,
        Err(e) => Err(e),
    };

    if let Err(e) = registered {
        error!("Registering {} failed, rolling back: {}", paths.name, e);
        let _ = registry.unregister(&paths.name);
        if let Err(rm_err) = fs::remove_dir_all(&paths.abs_path).await {
            error!(
                "Failed to roll back {}: {}",
                paths.abs_path.display(),
                rm_err
            );
        }
        return Err(Error::registry(format!(
            "Error creating node registry entry for {}: {}",
            paths.name, e
        )));
    }

    info!("Package {} created at {}", entry.name, entry.path);
    Ok(entry)
}

/// Check that a package exists on disk and in the registry, and describe it
pub async fn inspect_package(registry: &NodeRegistry, paths: &PackagePaths) -> Result<PackageInfo> {
    let metadata = match fs::metadata(&paths.abs_path).await {
        Ok(metadata) if metadata.is_dir() => metadata,
        _ => {
            return Err(Error::not_found(format!(
                "Package: {} is not in current directory",
                paths.name
            )));
        }
    };
    if !registry.contains(&paths.name) {
        return Err(Error::not_found(format!(
            "Package: {} is not in the node registry",
            paths.name
        )));
    }

    let created = metadata
        .created()
        .or_else(|_| metadata.modified())
        .ok()
        .map(DateTime::<Local>::from);

    Ok(PackageInfo {
        location: relative_to_root(registry, &paths.abs_path).await?,
        size_bytes: dir_size(&paths.abs_path).await?,
        created,
    })
}

/// Remove a package directory and its registry entry
///
/// The registry is updated first; if the directory cannot be removed the
/// entry is restored.
pub async fn delete_package(
    registry: &mut NodeRegistry,
    paths: &PackagePaths,
) -> Result<RegistryEntry> {
    inspect_package(registry, paths).await?;
    ensure_removable(registry.repo_root(), &paths.abs_path).await?;

    let entry = registry.unregister(&paths.name)?;
    if let Err(e) = registry.save().await {
        registry.register(entry)?;
        return Err(e);
    }

    if let Err(e) = fs::remove_dir_all(&paths.abs_path).await {
        warn!("Removing {} failed, restoring registry entry", paths.abs_path.display());
        registry.register(entry)?;
        registry.save().await?;
        return Err(e.into());
    }

    info!("Package {} deleted", entry.name);
    Ok(entry)
}

/// Look up where a package is registered
pub fn find_package<'a>(registry: &'a NodeRegistry, name: &str) -> Result<&'a RegistryEntry> {
    registry.find(name).ok_or_else(|| {
        Error::not_found(format!("Package: {} is not in the node registry", name))
    })
}

/// Refuse to delete anything that is not a directory strictly inside the repo
async fn ensure_removable(repo_root: &Path, path: &Path) -> Result<()> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|_| Error::invalid_input(format!("Delete: {} does not exist", path.display())))?;
    if !metadata.is_dir() {
        return Err(Error::invalid_input(format!(
            "Delete: {} is not a directory",
            path.display()
        )));
    }

    let root = fs::canonicalize(repo_root).await?;
    let target = fs::canonicalize(path).await?;

    if !target.starts_with(&root) {
        return Err(Error::invalid_input(format!(
            "Delete: {} is not within the repository",
            target.display()
        )));
    }
    if target == root || target.parent().is_none() {
        return Err(Error::invalid_input(format!(
            "Delete: refusing to remove {}",
            target.display()
        )));
    }

    Ok(())
}

/// Total size of every file under `path`
pub async fn dir_size(path: &Path) -> Result<u64> {
    let mut total = 0;
    let mut pending = vec![path.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                total += entry.metadata().await?.len();
            }
        }
    }

    Ok(total)
}

// # Node Registry
//
// Bookkeeping for the node packages that live in a repository.
//
// ## File Format
//
// `node_registry.json` at the repository root:
//
// ```json
// {
//   "nodes": [
//     {
//       "name": "fake_node",
//       "path": "src/fake_node",
//       "target": "qnx",
//       "type": "rti_dds"
//     }
//   ]
// }
// ```
//
// Keys are written in sorted order with two-space indentation and a trailing
// newline, so hand edits and tool edits produce the same diffs. Keys this
// module does not know about (top-level or per node) are kept as they are.
//
// ## Durability
//
// - Atomic writes: new content goes to `.tmp`, then is renamed over the file
// - Backup: the previous file is copied to `.backup` before each rename

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Registry file name expected at the repository root
pub const REGISTRY_FILE_NAME: &str = "node_registry.json";

/// Node type recorded for new packages
pub const DEFAULT_NODE_TYPE: &str = "rti_dds";

/// Deployment target recorded for new packages
pub const DEFAULT_TARGET: &str = "qnx";

/// One registered node package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Package name (snake_case)
    pub name: String,

    /// Package directory relative to the repository root
    pub path: String,

    /// When the package was registered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,

    /// Deployment target
    pub target: String,

    /// Node middleware type
    #[serde(rename = "type")]
    pub node_type: String,

    /// Any other keys found in the file
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RegistryEntry {
    /// Create an entry with the default type and target
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            registered_at: Some(Utc::now()),
            target: DEFAULT_TARGET.to_string(),
            node_type: DEFAULT_NODE_TYPE.to_string(),
            extra: BTreeMap::new(),
        }
    }
}

/// Serializable registry file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    nodes: Vec<RegistryEntry>,

    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

/// In-memory view of `node_registry.json`
///
/// Mutations only touch memory; call [`NodeRegistry::save`] to persist.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    path: PathBuf,
    file: RegistryFile,
}

impl NodeRegistry {
    /// Load an existing registry file
    ///
    /// A missing or unparsable file is an error; the registry is expected to
    /// exist before any package is managed. The stored path is canonical, so
    /// `repo_root()` is absolute even when `path` is relative.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = Self::resolve(path.as_ref()).await?;

        let content = fs::read_to_string(&path).await.map_err(|e| {
            Error::registry(format!(
                "Failed to read registry {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: RegistryFile = serde_json::from_str(&content).map_err(|e| {
            Error::registry(format!(
                "Failed to parse registry {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            "Loaded registry {} with {} node(s)",
            path.display(),
            file.nodes.len()
        );

        Ok(Self { path, file })
    }

    /// Create a new, empty registry file
    ///
    /// Fails if the file already exists.
    pub async fn init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = Self::resolve(path.as_ref()).await?;
        if fs::try_exists(&path).await? {
            return Err(Error::already_exists(format!(
                "Registry {} already exists",
                path.display()
            )));
        }

        let registry = Self {
            path,
            file: RegistryFile::default(),
        };
        registry.save().await?;
        tracing::info!("Created registry {}", registry.path.display());
        Ok(registry)
    }

    /// Walk up from `start` looking for a registry file
    pub async fn discover<P: AsRef<Path>>(start: P) -> Option<PathBuf> {
        for dir in start.as_ref().ancestors() {
            let candidate = dir.join(REGISTRY_FILE_NAME);
            if let Ok(metadata) = fs::metadata(&candidate).await
                && metadata.is_file()
            {
                return Some(candidate);
            }
        }
        None
    }

    /// Canonical form of a registry path whose file may not exist yet
    async fn resolve(path: &Path) -> Result<PathBuf> {
        let file_name = path.file_name().ok_or_else(|| {
            Error::invalid_input(format!("Registry path {} has no file name", path.display()))
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let parent = fs::canonicalize(parent).await.map_err(|e| {
            Error::registry(format!(
                "Failed to resolve registry directory {}: {}",
                parent.display(),
                e
            ))
        })?;
        Ok(parent.join(file_name))
    }

    /// Path of the registry file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Repository root (the directory holding the registry file)
    pub fn repo_root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// All registered entries, in file order
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.file.nodes
    }

    /// Look up an entry by package name
    pub fn find(&self, name: &str) -> Option<&RegistryEntry> {
        self.file.nodes.iter().find(|node| node.name == name)
    }

    /// Whether a package name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Add an entry
    pub fn register(&mut self, entry: RegistryEntry) -> Result<()> {
        validate_package_name(&entry.name)?;

        if let Some(existing) = self.find(&entry.name) {
            return Err(Error::already_exists(format!(
                "Package '{}' is already registered at '{}'",
                existing.name, existing.path
            )));
        }

        tracing::debug!("Registering {} at {}", entry.name, entry.path);
        self.file.nodes.push(entry);
        Ok(())
    }

    /// Remove an entry, returning it
    pub fn unregister(&mut self, name: &str) -> Result<RegistryEntry> {
        let index = self
            .file
            .nodes
            .iter()
            .position(|node| node.name == name)
            .ok_or_else(|| {
                Error::not_found(format!("Package '{}' is not in the node registry", name))
            })?;

        tracing::debug!("Unregistering {}", name);
        Ok(self.file.nodes.remove(index))
    }

    /// Write the registry to disk atomically
    pub async fn save(&self) -> Result<()> {
        // Going through Value sorts every object's keys, flattened ones included
        let document = serde_json::to_value(&self.file)
            .map_err(|e| Error::registry(format!("Failed to serialize registry: {}", e)))?;
        let mut json = serde_json::to_string_pretty(&document)
            .map_err(|e| Error::registry(format!("Failed to serialize registry: {}", e)))?;
        json.push('\n');

        // Write to temporary file first
        let temp_path = Self::sibling_path(&self.path, "tmp");
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::registry(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::registry(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::registry(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the previous version around
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let backup_path = Self::sibling_path(&self.path, "backup");
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create registry backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::registry(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Registry written to {}", self.path.display());
        Ok(())
    }

    fn sibling_path(path: &Path, extension: &str) -> PathBuf {
        let mut sibling = path.to_path_buf();
        sibling.set_extension(extension);
        sibling
    }
}

/// Check that a package name is non-empty snake_case (`[a-z0-9_]+`)
pub fn validate_package_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input("Package name cannot be empty"));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(Error::invalid_input(format!(
            "Invalid package name '{}': must be in 'snake_case'",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_package_name() {
        assert!(validate_package_name("fake_node").is_ok());
        assert!(validate_package_name("bms2").is_ok());
        assert!(validate_package_name("_").is_ok());

        assert!(validate_package_name("").is_err());
        assert!(validate_package_name("FakeNode").is_err());
        assert!(validate_package_name("fake-node").is_err());
        assert!(validate_package_name("fake node").is_err());
        assert!(validate_package_name("../escape").is_err());
    }

    #[test]
    fn test_entry_serializes_sorted_keys() {
        let entry = RegistryEntry {
            registered_at: None,
            ..RegistryEntry::new("fake_node", "src/fake_node")
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"name":"fake_node","path":"src/fake_node","target":"qnx","type":"rti_dds"}"#
        );
    }

    #[tokio::test]
    async fn test_init_then_load_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(REGISTRY_FILE_NAME);

        NodeRegistry::init(&path).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\n  \"nodes\": []\n}\n"
        );

        let registry = NodeRegistry::load(&path).await.unwrap();
        assert!(registry.entries().is_empty());
        assert_eq!(registry.repo_root(), dir.path().canonicalize().unwrap());

        // Second init refuses to clobber
        assert!(matches!(
            NodeRegistry::init(&path).await,
            Err(Error::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_and_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(REGISTRY_FILE_NAME);

        assert!(matches!(
            NodeRegistry::load(&path).await,
            Err(Error::Registry(_))
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            NodeRegistry::load(&path).await,
            Err(Error::Registry(_))
        ));
    }

    #[tokio::test]
    async fn test_loads_registry_without_timestamps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(REGISTRY_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"nodes":[{"name":"fake_node","path":"src/fake_node","target":"qnx","type":"rti_dds"}]}"#,
        )
        .unwrap();

        let registry = NodeRegistry::load(&path).await.unwrap();
        let entry = registry.find("fake_node").unwrap();
        assert_eq!(entry.path, "src/fake_node");
        assert_eq!(entry.node_type, "rti_dds");
        assert_eq!(entry.registered_at, None);
    }

    #[tokio::test]
    async fn test_save_creates_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(REGISTRY_FILE_NAME);

        let mut registry = NodeRegistry::init(&path).await.unwrap();
        registry
            .register(RegistryEntry::new("fake_node", "src/fake_node"))
            .unwrap();
        registry.save().await.unwrap();

        let backup = dir.path().join("node_registry.backup");
        assert!(backup.exists(), "previous registry should be backed up");
        assert_eq!(
            std::fs::read_to_string(&backup).unwrap(),
            "{\n  \"nodes\": []\n}\n"
        );
        assert!(!dir.path().join("node_registry.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_keeps_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(REGISTRY_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"version":2,"nodes":[{"name":"fake_node","owner":"elec","path":"src/fake_node","target":"qnx","type":"rti_dds"}]}"#,
        )
        .unwrap();

        let mut registry = NodeRegistry::load(&path).await.unwrap();
        assert_eq!(
            registry.find("fake_node").unwrap().extra.get("owner"),
            Some(&serde_json::json!("elec"))
        );
        registry
            .register(RegistryEntry {
                registered_at: None,
                ..RegistryEntry::new("bms", "src/bms")
            })
            .unwrap();
        registry.save().await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let document: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(document["version"], 2);
        assert_eq!(document["nodes"][0]["owner"], "elec");
        assert_eq!(document["nodes"][1]["name"], "bms");

        // Flattened keys are sorted in with the known ones
        let first = written.find("\"name\": \"fake_node\"").unwrap();
        let owner = written.find("\"owner\"").unwrap();
        let path_key = written[first..].find("\"path\"").unwrap() + first;
        assert!(first < owner && owner < path_key);
        assert!(written.find("\"nodes\"").unwrap() < written.find("\"version\"").unwrap());
        assert!(written.ends_with("}\n"));
    }

    /// `target` spelled relative to the current directory, without changing it
    #[cfg(unix)]
    fn relative_from_cwd(target: &Path) -> PathBuf {
        use std::path::Component;

        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        let mut relative = PathBuf::new();
        for component in cwd.components() {
            if let Component::Normal(_) = component {
                relative.push("..");
            }
        }
        relative.join(target.strip_prefix("/").unwrap())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relative_path_resolves_to_absolute_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let relative = relative_from_cwd(&root.join(REGISTRY_FILE_NAME));
        assert!(relative.is_relative());

        let registry = NodeRegistry::init(&relative).await.unwrap();
        assert!(registry.path().is_absolute());
        assert_eq!(registry.repo_root(), root);

        let registry = NodeRegistry::load(&relative).await.unwrap();
        assert_eq!(registry.path(), root.join(REGISTRY_FILE_NAME));
        assert_eq!(registry.repo_root(), root);
    }

    #[tokio::test]
    async fn test_discover_walks_up() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("src").join("fake_node");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(NodeRegistry::discover(&nested).await, None);

        // A directory with the registry's name is not a registry
        std::fs::create_dir(nested.join(REGISTRY_FILE_NAME)).unwrap();
        assert_eq!(NodeRegistry::discover(&nested).await, None);

        std::fs::write(dir.path().join(REGISTRY_FILE_NAME), "{\"nodes\":[]}").unwrap();
        assert_eq!(
            NodeRegistry::discover(&nested).await,
            Some(dir.path().join(REGISTRY_FILE_NAME))
        );
    }
}

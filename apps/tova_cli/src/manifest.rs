//! `tova.toml` project manifest (spec §6 "persisted state"): package name,
//! entry file, and target defaults. The core compiler never touches the
//! filesystem; this is the one place in the workspace that reads it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub package: Package,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default = "default_entry")]
    pub entry: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_entry() -> String {
    "src/main.tova".to_string()
}

impl Manifest {
    pub fn new(name: &str) -> Self {
        Self { package: Package { name: name.to_string(), entry: default_entry(), description: None } }
    }

    pub fn load(project_root: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = fs::read_to_string(project_root.join("tova.toml"))?;
        Ok(toml::from_str(&text)?)
    }

    pub fn to_toml(&self) -> Result<String, Box<dyn std::error::Error>> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Walks upward from `start` looking for `tova.toml`, the same
/// nearest-ancestor search the teacher's build tool uses to find its own
/// project root.
pub fn find_project_root(start: &Path) -> Option<std::path::PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join("tova.toml").is_file() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn round_trips_through_toml() {
        let manifest = Manifest::new("demo");
        let text = manifest.to_toml().unwrap();
        let parsed: Manifest = toml::from_str(&text).unwrap();
        assert_eq!(parsed.package.name, "demo");
        assert_eq!(parsed.package.entry, "src/main.tova");
    }

    #[test]
    fn find_project_root_walks_up_to_tova_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tova.toml"), "[package]\nname = \"x\"\n").unwrap();
        let nested = dir.path().join("src/nested");
        fs::create_dir_all(&nested).unwrap();
        let root = find_project_root(&nested).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn find_project_root_returns_none_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_project_root(dir.path()).is_none());
    }
}

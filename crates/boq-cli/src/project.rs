//! The on-disk project file.
//!
//! One JSON document holds everything a command needs: the flat category
//! records, the line items, and the catalog entries they reference. The
//! shape mirrors the engine's boundary contract (camelCase fields, ids as
//! plain integers, money as decimal strings).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use boq_core::catalog::{CatalogEntry, InMemoryCatalog};
use boq_core::engine::Snapshot;
use boq_core::model::{CatalogItemId, CategoryRecord, LineItem, ProjectId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    #[serde(default = "default_project_id")]
    pub project_id: ProjectId,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub catalog: HashMap<CatalogItemId, CatalogEntry>,
}

const fn default_project_id() -> ProjectId {
    ProjectId(1)
}

impl ProjectFile {
    /// Read and parse a project file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Write the project file, pretty-printed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Build a validated snapshot from the file's collections.
    pub fn snapshot(&self) -> boq_core::error::Result<Snapshot> {
        Snapshot::assemble(
            self.project_id,
            self.version,
            &self.categories,
            self.items.clone(),
        )
    }

    /// The file's catalog entries as a resolver.
    pub fn resolver(&self) -> InMemoryCatalog {
        self.catalog
            .iter()
            .map(|(id, entry)| (*id, entry.clone()))
            .collect()
    }

    /// Rebuild the file's flat collections from a mutated snapshot,
    /// keeping the catalog as-is. Records and items come out sorted by id
    /// so saved files diff cleanly.
    pub fn absorb(&mut self, snapshot: &Snapshot) {
        let tree = snapshot.tree();
        let mut categories: Vec<CategoryRecord> = tree
            .ids()
            .filter_map(|id| tree.get(id))
            .map(|node| CategoryRecord {
                id: node.id,
                name: node.name.clone(),
                parent_id: node.parent_id,
                level: node.level,
                order_seq: node.order_seq,
                is_active: node.is_active,
            })
            .collect();
        categories.sort_by_key(|r| r.id);

        let mut items: Vec<LineItem> = snapshot.ledger().iter().cloned().collect();
        items.sort_by_key(|it| it.id);

        self.categories = categories;
        self.items = items;
        self.version = snapshot.version() + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boq_core::engine::Mutation;
    use boq_core::model::CategoryId;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "projectId": 7,
        "categories": [
            {"id": 1, "name": "Earthworks", "parentId": null, "level": 0, "orderSeq": 0},
            {"id": 2, "name": "Excavation", "parentId": 1, "level": 1, "orderSeq": 0}
        ],
        "items": [
            {"id": 1, "categoryId": 2, "catalogItemId": 1, "quantity": "10", "unitPrice": "50000"}
        ],
        "catalog": {
            "1": {"name": "Excavation soil", "unit": "m3", "referencePrice": "50000"}
        }
    }"#;

    #[test]
    fn load_parses_the_boundary_shape() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{SAMPLE}").expect("write");
        let project = ProjectFile::load(file.path()).expect("load");
        assert_eq!(project.project_id, ProjectId(7));
        assert_eq!(project.categories.len(), 2);
        assert_eq!(project.items.len(), 1);
        assert_eq!(project.catalog.len(), 1);
        let snapshot = project.snapshot().expect("snapshot");
        assert_eq!(snapshot.totals().grand_total.to_string(), "500000");
    }

    #[test]
    fn absorb_round_trips_through_a_mutation() {
        let mut project: ProjectFile = serde_json::from_str(SAMPLE).expect("parse");
        let mut snapshot = project.snapshot().expect("snapshot");
        snapshot
            .apply(Mutation::AddRootCategory {
                name: "Structure".into(),
            })
            .expect("apply");
        project.absorb(&snapshot);
        assert_eq!(project.categories.len(), 3);
        assert_eq!(project.version, 1);
        let reread = project.snapshot().expect("rebuild");
        assert!(reread.tree().contains(CategoryId(3)));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ProjectFile::load(Path::new("/nonexistent/project.json")).is_err());
    }
}

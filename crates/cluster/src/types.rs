use serde::{Deserialize, Serialize};

/// A node in the module forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Deterministic identifier (path prefix, `root` for the repo root,
    /// `~N`-suffixed when two modules share a prefix)
    pub id: String,

    /// Display name: last path component of the prefix
    pub name: String,

    /// Directory prefix this module covers ('' for the root)
    pub path_prefix: String,

    /// Parent module; `None` for forest roots
    pub parent_id: Option<String>,

    pub stats: ModuleStats,
}

/// Aggregate numbers for a module's subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleStats {
    /// Files in this module's subtree
    pub file_count: usize,

    /// Dependency edges with both endpoints inside the subtree
    pub internal_edges: usize,
}

/// Files directly assigned to one (leaf) module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleNode {
    pub module_id: String,
    /// Sorted file paths
    pub files: Vec<String>,
}

/// The clustering result: a forest of modules plus the leaf-level file
/// assignments. Every input file appears in exactly one assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleTree {
    /// All modules, sorted by id
    pub modules: Vec<Module>,

    /// Per-leaf file assignments, sorted by module_id
    pub assignments: Vec<ModuleNode>,
}

impl ModuleTree {
    pub fn get(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn roots(&self) -> Vec<&Module> {
        self.modules.iter().filter(|m| m.parent_id.is_none()).collect()
    }

    pub fn children(&self, id: &str) -> Vec<&Module> {
        self.modules
            .iter()
            .filter(|m| m.parent_id.as_deref() == Some(id))
            .collect()
    }

    /// The module's subtree, including itself, in sorted id order
    pub fn descendant_ids(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if self.get(&current).is_none() {
                continue;
            }
            for child in self.children(&current) {
                stack.push(child.id.clone());
            }
            out.push(current);
        }
        out.sort();
        out
    }

    /// Files directly assigned to a module (leaves only)
    pub fn files_of(&self, id: &str) -> &[String] {
        self.assignments
            .iter()
            .find(|a| a.module_id == id)
            .map(|a| a.files.as_slice())
            .unwrap_or(&[])
    }

    /// All files in the module's subtree, sorted
    pub fn subtree_files(&self, id: &str) -> Vec<String> {
        let mut files: Vec<String> = self
            .descendant_ids(id)
            .iter()
            .flat_map(|m| self.files_of(m).iter().cloned())
            .collect();
        files.sort();
        files
    }

    /// The leaf module a file is assigned to
    pub fn module_of_file(&self, path: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.files.iter().any(|f| f == path))
            .map(|a| a.module_id.as_str())
    }

    /// Total number of assigned files
    pub fn assigned_file_count(&self) -> usize {
        self.assignments.iter().map(|a| a.files.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ModuleTree {
        ModuleTree {
            modules: vec![
                Module {
                    id: "root".into(),
                    name: "root".into(),
                    path_prefix: String::new(),
                    parent_id: None,
                    stats: ModuleStats::default(),
                },
                Module {
                    id: "src".into(),
                    name: "src".into(),
                    path_prefix: "src".into(),
                    parent_id: Some("root".into()),
                    stats: ModuleStats::default(),
                },
            ],
            assignments: vec![
                ModuleNode {
                    module_id: "root".into(),
                    files: vec!["README.md".into()],
                },
                ModuleNode {
                    module_id: "src".into(),
                    files: vec!["src/a.py".into(), "src/b.py".into()],
                },
            ],
        }
    }

    #[test]
    fn test_descendants_include_self() {
        let t = tree();
        assert_eq!(t.descendant_ids("root"), vec!["root", "src"]);
        assert_eq!(t.descendant_ids("src"), vec!["src"]);
    }

    #[test]
    fn test_module_of_file() {
        let t = tree();
        assert_eq!(t.module_of_file("src/a.py"), Some("src"));
        assert_eq!(t.module_of_file("missing.py"), None);
    }

    #[test]
    fn test_subtree_files() {
        let t = tree();
        assert_eq!(
            t.subtree_files("root"),
            vec!["README.md", "src/a.py", "src/b.py"]
        );
    }
}

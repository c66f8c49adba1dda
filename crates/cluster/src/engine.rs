use crate::config::ClusterConfig;
use crate::error::{ClusterError, Result};
use crate::types::{Module, ModuleNode, ModuleStats, ModuleTree};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Deterministic module clustering.
///
/// Seeds one candidate per directory (bounded depth, small directories
/// folded into their parents), then greedily merges the densest sibling
/// pair until no pair clears the density threshold. For a fixed (files,
/// edges) input the output is byte-for-byte identical across runs: seeds
/// are created in path order, pair scoring iterates in path order, and
/// ties break on path order.
pub struct ClusterEngine {
    config: ClusterConfig,
}

/// One candidate cluster in the merge arena. Merged candidates stay in the
/// arena as interior tree nodes; `alive` marks current forest roots.
struct Candidate {
    prefix: String,
    files: BTreeSet<String>,
    /// Arena indices of directly merged constituents; empty for seeds
    children: Vec<usize>,
    /// Arena index of the group this candidate was merged into
    merged_into: Option<usize>,
    alive: bool,
}

impl ClusterEngine {
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate().map_err(ClusterError::invalid_input)?;
        Ok(Self { config })
    }

    /// Partition `files` into a module forest using `edges` (file-level
    /// dependency pairs) as the merge signal.
    pub fn cluster(&self, files: &[String], edges: &[(String, String)]) -> Result<ModuleTree> {
        self.validate_input(files, edges)?;
        if files.is_empty() {
            return Ok(ModuleTree::default());
        }

        let seeds = self.seed_partition(files);
        let mut arena: Vec<Candidate> = seeds
            .into_iter()
            .map(|(prefix, files)| Candidate {
                prefix,
                files,
                children: Vec::new(),
                merged_into: None,
                alive: true,
            })
            .collect();

        self.merge_loop(&mut arena, edges);
        let tree = self.assemble(&arena, edges);

        log::info!(
            "clustered {} files into {} modules ({} leaves)",
            files.len(),
            tree.modules.len(),
            tree.assignments.len()
        );
        Ok(tree)
    }

    fn validate_input(&self, files: &[String], edges: &[(String, String)]) -> Result<()> {
        let mut seen = BTreeSet::new();
        for file in files {
            if file.is_empty() {
                return Err(ClusterError::invalid_input("empty file path"));
            }
            if !seen.insert(file.as_str()) {
                return Err(ClusterError::invalid_input(format!(
                    "duplicate file path: {file}"
                )));
            }
        }
        for (src, dst) in edges {
            if !seen.contains(src.as_str()) || !seen.contains(dst.as_str()) {
                return Err(ClusterError::invalid_input(format!(
                    "edge endpoint outside file set: {src} -> {dst}"
                )));
            }
        }
        Ok(())
    }

    /// One seed per directory, truncated to `max_depth` components; seeds
    /// below `min_files_per_dir` fold into their parent until stable.
    fn seed_partition(&self, files: &[String]) -> BTreeMap<String, BTreeSet<String>> {
        let mut seeds: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for file in files {
            let prefix = truncate_depth(parent_dir(file), self.config.max_depth);
            seeds.entry(prefix).or_default().insert(file.clone());
        }

        loop {
            // Deepest first, so folds cascade toward the root in one pass
            let mut order: Vec<String> = seeds.keys().cloned().collect();
            order.sort_by_key(|p| std::cmp::Reverse(depth_of(p)));

            let mut changed = false;
            for prefix in order {
                if prefix.is_empty() {
                    continue;
                }
                let too_small = seeds
                    .get(&prefix)
                    .is_some_and(|f| f.len() < self.config.min_files_per_dir);
                if !too_small {
                    continue;
                }
                if let Some(files) = seeds.remove(&prefix) {
                    let parent = parent_dir(&prefix).to_string();
                    seeds.entry(parent).or_default().extend(files);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        seeds
    }

    /// Repeatedly merge the densest sibling pair under the size cap until
    /// no pair exceeds the threshold.
    fn merge_loop(&self, arena: &mut Vec<Candidate>, edges: &[(String, String)]) {
        loop {
            let Some((a, b)) = self.best_pair(arena, edges) else {
                break;
            };

            let prefix = common_dir_prefix(&arena[a].prefix, &arena[b].prefix);
            let mut files = arena[a].files.clone();
            files.extend(arena[b].files.iter().cloned());

            let group = arena.len();
            arena.push(Candidate {
                prefix,
                files,
                children: vec![a, b],
                merged_into: None,
                alive: true,
            });
            arena[a].alive = false;
            arena[a].merged_into = Some(group);
            arena[b].alive = false;
            arena[b].merged_into = Some(group);
        }
    }

    /// The eligible pair with the highest density, or `None` when done.
    /// Candidates are paired in (prefix, arena index) order so equal
    /// densities always resolve the same way.
    fn best_pair(&self, arena: &[Candidate], edges: &[(String, String)]) -> Option<(usize, usize)> {
        let mut alive: Vec<usize> = (0..arena.len()).filter(|&i| arena[i].alive).collect();
        alive.sort_by(|&x, &y| {
            arena[x]
                .prefix
                .cmp(&arena[y].prefix)
                .then(x.cmp(&y))
        });

        let owner: HashMap<&str, usize> = alive
            .iter()
            .flat_map(|&i| arena[i].files.iter().map(move |f| (f.as_str(), i)))
            .collect();

        let mut cross: HashMap<(usize, usize), usize> = HashMap::new();
        for (src, dst) in edges {
            let (Some(&a), Some(&b)) = (owner.get(src.as_str()), owner.get(dst.as_str())) else {
                continue;
            };
            if a == b {
                continue;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            *cross.entry(key).or_insert(0) += 1;
        }

        let mut best: Option<(f64, usize, usize)> = None;
        for (pos, &a) in alive.iter().enumerate() {
            for &b in alive.iter().skip(pos + 1) {
                if parent_dir(&arena[a].prefix) != parent_dir(&arena[b].prefix)
                    && arena[a].prefix != arena[b].prefix
                {
                    continue;
                }
                if arena[a].files.len() + arena[b].files.len() > self.config.max_module_size {
                    continue;
                }
                let key = if a < b { (a, b) } else { (b, a) };
                let crossing = *cross.get(&key).unwrap_or(&0);
                if crossing == 0 {
                    continue;
                }
                let density =
                    crossing as f64 / (arena[a].files.len() * arena[b].files.len()) as f64;
                if density <= self.config.merge_density_threshold {
                    continue;
                }
                // Strictly-greater keeps the first (path-ordered) pair on ties
                if best.map(|(d, _, _)| density > d).unwrap_or(true) {
                    best = Some((density, a, b));
                }
            }
        }
        best.map(|(_, a, b)| (a, b))
    }

    /// Turn the merge arena into the final forest: IDs from prefixes
    /// (uniquified in creation order), merge parents from the arena links,
    /// surviving roots attached to their nearest prefix ancestor.
    fn assemble(&self, arena: &[Candidate], edges: &[(String, String)]) -> ModuleTree {
        let mut used: BTreeSet<String> = BTreeSet::new();
        let mut ids: Vec<String> = Vec::with_capacity(arena.len());
        for candidate in arena {
            let base = if candidate.prefix.is_empty() {
                "root".to_string()
            } else {
                candidate.prefix.clone()
            };
            let mut id = base.clone();
            let mut n = 2;
            while !used.insert(id.clone()) {
                id = format!("{base}~{n}");
                n += 1;
            }
            ids.push(id);
        }

        let roots: Vec<usize> = (0..arena.len()).filter(|&i| arena[i].alive).collect();
        let mut modules = Vec::with_capacity(arena.len());
        for (idx, candidate) in arena.iter().enumerate() {
            let parent_id = match candidate.merged_into {
                Some(group) => Some(ids[group].clone()),
                None => nearest_ancestor(idx, &roots, arena).map(|i| ids[i].clone()),
            };
            let internal_edges = edges
                .iter()
                .filter(|(s, d)| candidate.files.contains(s) && candidate.files.contains(d))
                .count();
            modules.push(Module {
                id: ids[idx].clone(),
                name: module_name(&candidate.prefix),
                path_prefix: candidate.prefix.clone(),
                parent_id,
                stats: ModuleStats {
                    file_count: candidate.files.len(),
                    internal_edges,
                },
            });
        }
        modules.sort_by(|a, b| a.id.cmp(&b.id));

        let mut assignments: Vec<ModuleNode> = arena
            .iter()
            .enumerate()
            .filter(|(_, c)| c.children.is_empty())
            .map(|(idx, c)| ModuleNode {
                module_id: ids[idx].clone(),
                files: c.files.iter().cloned().collect(),
            })
            .collect();
        assignments.sort_by(|a, b| a.module_id.cmp(&b.module_id));

        ModuleTree {
            modules,
            assignments,
        }
    }
}

/// Among the other surviving roots, the one whose prefix is the longest
/// proper path-prefix of this candidate's prefix
fn nearest_ancestor(idx: usize, roots: &[usize], arena: &[Candidate]) -> Option<usize> {
    if !arena[idx].alive {
        return None;
    }
    roots
        .iter()
        .copied()
        .filter(|&r| r != idx)
        .filter(|&r| is_proper_path_prefix(&arena[r].prefix, &arena[idx].prefix))
        .max_by_key(|&r| (depth_of(&arena[r].prefix), std::cmp::Reverse(r)))
}

fn is_proper_path_prefix(shorter: &str, longer: &str) -> bool {
    if shorter == longer {
        return false;
    }
    if shorter.is_empty() {
        return true;
    }
    longer.starts_with(shorter) && longer.as_bytes().get(shorter.len()) == Some(&b'/')
}

fn module_name(prefix: &str) -> String {
    if prefix.is_empty() {
        return "root".to_string();
    }
    prefix.rsplit('/').next().unwrap_or(prefix).to_string()
}

/// The longest shared leading path-component sequence of two prefixes.
fn common_dir_prefix(a: &str, b: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut ai = a.split('/');
    let mut bi = b.split('/');
    loop {
        match (ai.next(), bi.next()) {
            (Some(x), Some(y)) if x == y && !x.is_empty() => parts.push(x),
            _ => break,
        }
    }
    parts.join("/")
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn depth_of(prefix: &str) -> usize {
    if prefix.is_empty() {
        0
    } else {
        prefix.split('/').count()
    }
}

fn truncate_depth(prefix: &str, max_depth: usize) -> String {
    if prefix.is_empty() {
        return String::new();
    }
    prefix
        .split('/')
        .take(max_depth)
        .collect::<Vec<_>>()
        .join("/")
}

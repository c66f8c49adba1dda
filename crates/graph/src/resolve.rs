use repolens_extractor::Language;
use std::collections::BTreeSet;

/// Resolve an import statement to a file in the analyzed set.
///
/// Resolution is best-effort and purely lexical: candidate paths are probed
/// against the finalized file list, never the filesystem. `None` means the
/// import points outside the repository (third-party or unresolvable).
pub fn resolve_import(
    language: Language,
    importer: &str,
    module: &str,
    files: &BTreeSet<String>,
) -> Option<String> {
    match language {
        Language::Python => resolve_python(importer, module, files),
        Language::Java => resolve_java(module, files),
        Language::Rust => resolve_rust(importer, module, files),
        Language::JavaScript | Language::TypeScript => resolve_js(importer, module, files),
        Language::Unknown => None,
    }
}

/// `import x.y` -> `x/y.py` | `x/y/__init__.py`, probed from the repo root
/// and from the importer's directory; leading dots climb directories.
fn resolve_python(importer: &str, module: &str, files: &BTreeSet<String>) -> Option<String> {
    let dots = module.chars().take_while(|&c| c == '.').count();
    let rest = module[dots..].replace('.', "/");

    if dots > 0 {
        let mut base = parent_dir(importer).to_string();
        for _ in 1..dots {
            base = parent_dir(&base).to_string();
        }
        let joined = join(&base, &rest);
        return probe(files, &[format!("{joined}.py"), format!("{joined}/__init__.py")]);
    }

    let root_candidates = [format!("{rest}.py"), format!("{rest}/__init__.py")];
    if let Some(hit) = probe(files, &root_candidates) {
        return Some(hit);
    }
    let local = join(parent_dir(importer), &rest);
    probe(files, &[format!("{local}.py"), format!("{local}/__init__.py")])
}

/// `import com.a.B;` -> `com/a/B.java`, falling back to the lexicographically
/// smallest file with that package-path suffix (handles src/main/java roots)
fn resolve_java(module: &str, files: &BTreeSet<String>) -> Option<String> {
    let path = format!("{}.java", module.replace('.', "/"));
    if files.contains(&path) {
        return Some(path);
    }
    let suffix = format!("/{path}");
    files.iter().find(|f| f.ends_with(&suffix)).cloned()
}

/// `use crate::a::b` -> `src/a/b.rs` | `src/a/b/mod.rs`; `self::`/`super::`
/// paths resolve relative to the importer. External crates are unresolved.
fn resolve_rust(importer: &str, module: &str, files: &BTreeSet<String>) -> Option<String> {
    // `use a::{b, c}` keeps only the path up to the brace group
    let module = module.split('{').next().unwrap_or(module);
    let module = module.trim().trim_end_matches("::").trim_end_matches("::*");

    let (base, rest) = if let Some(rest) = module.strip_prefix("crate::") {
        (src_root(importer), rest.to_string())
    } else if let Some(rest) = module.strip_prefix("self::") {
        (parent_dir(importer).to_string(), rest.to_string())
    } else if let Some(rest) = module.strip_prefix("super::") {
        (
            parent_dir(parent_dir(importer)).to_string(),
            rest.to_string(),
        )
    } else {
        return None;
    };

    let mut segments: Vec<&str> = rest.split("::").collect();
    // The last segment is usually an item, not a module: probe both depths
    while !segments.is_empty() {
        let path = join(&base, &segments.join("/"));
        if let Some(hit) = probe(files, &[format!("{path}.rs"), format!("{path}/mod.rs")]) {
            return Some(hit);
        }
        segments.pop();
    }
    None
}

/// Relative specifiers only; bare specifiers are package imports
fn resolve_js(importer: &str, module: &str, files: &BTreeSet<String>) -> Option<String> {
    if !module.starts_with("./") && !module.starts_with("../") {
        return None;
    }
    let joined = join(parent_dir(importer), module);
    let candidates = [
        joined.clone(),
        format!("{joined}.ts"),
        format!("{joined}.tsx"),
        format!("{joined}.js"),
        format!("{joined}.jsx"),
        format!("{joined}/index.ts"),
        format!("{joined}/index.js"),
    ];
    probe(files, &candidates)
}

fn probe(files: &BTreeSet<String>, candidates: &[String]) -> Option<String> {
    candidates.iter().find(|c| files.contains(*c)).cloned()
}

/// Directory part of a '/'-separated path; empty string at the root
fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// The `src/` directory closest to the importer, for `crate::` paths
fn src_root(importer: &str) -> String {
    let mut dir = parent_dir(importer);
    loop {
        if dir.ends_with("src") || dir == "src" {
            return dir.to_string();
        }
        if dir.is_empty() {
            return "src".to_string();
        }
        dir = parent_dir(dir);
    }
}

/// Join and normalize a '/'-separated path, collapsing `.` and `..`
fn join(base: &str, rel: &str) -> String {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_python_root_relative() {
        let files = file_set(&["a.py", "b.py", "pkg/__init__.py", "pkg/util.py"]);
        assert_eq!(
            resolve_import(Language::Python, "b.py", "a", &files),
            Some("a.py".to_string())
        );
        assert_eq!(
            resolve_import(Language::Python, "b.py", "pkg.util", &files),
            Some("pkg/util.py".to_string())
        );
        assert_eq!(
            resolve_import(Language::Python, "b.py", "pkg", &files),
            Some("pkg/__init__.py".to_string())
        );
        assert_eq!(resolve_import(Language::Python, "b.py", "requests", &files), None);
    }

    #[test]
    fn test_python_relative_import() {
        let files = file_set(&["pkg/a.py", "pkg/b.py", "pkg/sub/c.py"]);
        assert_eq!(
            resolve_import(Language::Python, "pkg/b.py", ".a", &files),
            Some("pkg/a.py".to_string())
        );
        assert_eq!(
            resolve_import(Language::Python, "pkg/sub/c.py", "..a", &files),
            Some("pkg/a.py".to_string())
        );
    }

    #[test]
    fn test_java_package_and_suffix() {
        let files = file_set(&["src/main/java/com/app/Svc.java", "com/lib/Util.java"]);
        assert_eq!(
            resolve_import(Language::Java, "x.java", "com.lib.Util", &files),
            Some("com/lib/Util.java".to_string())
        );
        assert_eq!(
            resolve_import(Language::Java, "x.java", "com.app.Svc", &files),
            Some("src/main/java/com/app/Svc.java".to_string())
        );
        assert_eq!(resolve_import(Language::Java, "x.java", "java.util.List", &files), None);
    }

    #[test]
    fn test_rust_crate_paths() {
        let files = file_set(&["src/lib.rs", "src/io/reader.rs", "src/io/mod.rs"]);
        assert_eq!(
            resolve_import(Language::Rust, "src/lib.rs", "crate::io::reader", &files),
            Some("src/io/reader.rs".to_string())
        );
        // Item import falls back to the declaring module file
        assert_eq!(
            resolve_import(Language::Rust, "src/lib.rs", "crate::io::reader::Reader", &files),
            Some("src/io/reader.rs".to_string())
        );
        assert_eq!(
            resolve_import(Language::Rust, "src/lib.rs", "serde::Serialize", &files),
            None
        );
    }

    #[test]
    fn test_js_relative_probing() {
        let files = file_set(&["src/app.ts", "src/util.ts", "src/lib/index.ts"]);
        assert_eq!(
            resolve_import(Language::TypeScript, "src/app.ts", "./util", &files),
            Some("src/util.ts".to_string())
        );
        assert_eq!(
            resolve_import(Language::TypeScript, "src/app.ts", "./lib", &files),
            Some("src/lib/index.ts".to_string())
        );
        assert_eq!(resolve_import(Language::TypeScript, "src/app.ts", "react", &files), None);
    }

    #[test]
    fn test_join_normalizes_dotdot() {
        assert_eq!(join("a/b", "../c"), "a/c");
        assert_eq!(join("", "x/y"), "x/y");
        assert_eq!(join("a", "./b"), "a/b");
    }
}

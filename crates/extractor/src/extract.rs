use crate::error::{ExtractError, Result};
use crate::language::Language;
use crate::types::{FileExtraction, RawReference, ReferenceKind, SymbolKind, SymbolRecord};
use tree_sitter::{Node, Parser};

/// Maximum length kept for a declaration signature
const MAX_SIGNATURE_CHARS: usize = 160;

/// Registry of language extractors, built once per analysis run and passed
/// by reference. Constructing a [`FileExtractor`] allocates a fresh parser,
/// so parallel workers never share parser state.
#[derive(Debug, Clone)]
pub struct ExtractorRegistry {
    languages: Vec<Language>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            languages: vec![
                Language::Rust,
                Language::Python,
                Language::Java,
                Language::JavaScript,
                Language::TypeScript,
            ],
        }
    }

    /// Languages this registry can extract
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn supports(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }

    /// Build an extractor for a language
    pub fn extractor(&self, language: Language) -> Result<FileExtractor> {
        if !self.supports(language) {
            return Err(ExtractError::unsupported_language(language.as_str()));
        }
        FileExtractor::new(language)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts symbols and raw references from a single file
pub struct FileExtractor {
    language: Language,
    parser: Parser,
}

impl FileExtractor {
    pub fn new(language: Language) -> Result<Self> {
        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ExtractError::tree_sitter(format!("failed to set language: {e}")))?;

        Ok(Self { language, parser })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse one file into symbols (declaration order) and raw references.
    ///
    /// A syntax tree with error nodes still yields partial output; only a
    /// parser failure to produce a tree at all is an error.
    pub fn extract(&mut self, path: &str, source: &str) -> Result<FileExtraction> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::parse(path, "parser produced no tree"))?;

        let mut out = FileExtraction::default();
        let mut stack: Vec<usize> = Vec::new();

        let walk = Walk {
            language: self.language,
            source,
        };
        walk.visit(tree.root_node(), &mut out, &mut stack);

        log::debug!(
            "extracted {}: {} symbols, {} references",
            path,
            out.symbols.len(),
            out.references.len()
        );
        Ok(out)
    }
}

/// Stateless walker over one file's syntax tree. The container stack holds
/// indices into the output symbol list, so nesting is tracked by position
/// rather than by name.
struct Walk<'s> {
    language: Language,
    source: &'s str,
}

impl<'s> Walk<'s> {
    fn visit(&self, node: Node, out: &mut FileExtraction, stack: &mut Vec<usize>) {
        match self.language {
            Language::Python => self.visit_python(node, out, stack),
            Language::Java => self.visit_java(node, out, stack),
            Language::Rust => self.visit_rust(node, out, stack),
            Language::JavaScript | Language::TypeScript => self.visit_js(node, out, stack),
            Language::Unknown => {}
        }
    }

    fn recurse(&self, node: Node, out: &mut FileExtraction, stack: &mut Vec<usize>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, out, stack);
        }
    }

    // -- Python ----------------------------------------------------------

    fn visit_python(&self, node: Node, out: &mut FileExtraction, stack: &mut Vec<usize>) {
        match node.kind() {
            "class_definition" => {
                let idx = self.push_symbol(node, SymbolKind::Class, out, stack);
                if let Some(supers) = node.child_by_field_name("superclasses") {
                    for base in self.collect_names(supers, &["identifier", "attribute"]) {
                        out.references.push(RawReference {
                            kind: ReferenceKind::Inherit,
                            name: last_segment(&base),
                            detail: base,
                            line: node.start_position().row + 1,
                            container: Some(idx),
                        });
                    }
                }
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "function_definition" => {
                let kind = self.nested_function_kind(out, stack);
                let idx = self.push_symbol(node, kind, out, stack);
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "import_statement" => {
                let text = self.node_text(node).trim().to_string();
                let module = text.trim_start_matches("import").trim().to_string();
                self.push_import(node, &module, &text, out, stack);
            }
            "import_from_statement" => {
                let module = node
                    .child_by_field_name("module_name")
                    .map(|n| self.node_text(n).to_string())
                    .unwrap_or_default();
                let text = self.node_text(node).trim().to_string();
                self.push_import(node, &module, &text, out, stack);
            }
            "call" => {
                if let Some(func) = node.child_by_field_name("function") {
                    let detail = self.node_text(func).to_string();
                    out.references.push(RawReference {
                        kind: ReferenceKind::Call,
                        name: last_segment(&detail),
                        detail,
                        line: node.start_position().row + 1,
                        container: stack.last().copied(),
                    });
                }
                self.recurse(node, out, stack);
            }
            "attribute" => {
                if let Some(attr) = node.child_by_field_name("attribute") {
                    let name = self.node_text(attr).to_string();
                    out.references.push(RawReference {
                        kind: ReferenceKind::Use,
                        name: name.clone(),
                        detail: name,
                        line: node.start_position().row + 1,
                        container: stack.last().copied(),
                    });
                }
                self.recurse(node, out, stack);
            }
            "assignment" if stack.is_empty() => {
                if let Some(left) = node.child_by_field_name("left") {
                    if left.kind() == "identifier" {
                        out.symbols.push(SymbolRecord {
                            kind: SymbolKind::Variable,
                            name: self.node_text(left).to_string(),
                            signature: self.signature(node),
                            container: None,
                            line_start: node.start_position().row + 1,
                            line_end: node.end_position().row + 1,
                        });
                    }
                }
                self.recurse(node, out, stack);
            }
            _ => self.recurse(node, out, stack),
        }
    }

    // -- Java ------------------------------------------------------------

    fn visit_java(&self, node: Node, out: &mut FileExtraction, stack: &mut Vec<usize>) {
        match node.kind() {
            "class_declaration" | "interface_declaration" | "enum_declaration" => {
                let idx = self.push_symbol(node, SymbolKind::Class, out, stack);
                for field in ["superclass", "interfaces"] {
                    if let Some(clause) = node.child_by_field_name(field) {
                        for base in self.collect_names(clause, &["type_identifier"]) {
                            out.references.push(RawReference {
                                kind: ReferenceKind::Inherit,
                                name: last_segment(&base),
                                detail: base,
                                line: node.start_position().row + 1,
                                container: Some(idx),
                            });
                        }
                    }
                }
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "method_declaration" | "constructor_declaration" => {
                let idx = self.push_symbol(node, SymbolKind::Method, out, stack);
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "field_declaration" => {
                if let Some(declarator) = node.child_by_field_name("declarator") {
                    if let Some(name) = declarator.child_by_field_name("name") {
                        out.symbols.push(SymbolRecord {
                            kind: SymbolKind::Variable,
                            name: self.node_text(name).to_string(),
                            signature: self.signature(node),
                            container: stack.last().copied(),
                            line_start: node.start_position().row + 1,
                            line_end: node.end_position().row + 1,
                        });
                    }
                }
                self.recurse(node, out, stack);
            }
            "import_declaration" => {
                let text = self.node_text(node).trim().to_string();
                let module = text
                    .trim_start_matches("import")
                    .trim_start_matches(" static")
                    .trim()
                    .trim_end_matches(';')
                    .trim()
                    .to_string();
                self.push_import(node, &module, &text, out, stack);
            }
            "method_invocation" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.node_text(n).to_string())
                    .unwrap_or_default();
                if !name.is_empty() {
                    out.references.push(RawReference {
                        kind: ReferenceKind::Call,
                        name: last_segment(&name),
                        detail: name,
                        line: node.start_position().row + 1,
                        container: stack.last().copied(),
                    });
                }
                self.recurse(node, out, stack);
            }
            "object_creation_expression" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    let detail = self.node_text(ty).to_string();
                    out.references.push(RawReference {
                        kind: ReferenceKind::Call,
                        name: last_segment(&detail),
                        detail,
                        line: node.start_position().row + 1,
                        container: stack.last().copied(),
                    });
                }
                self.recurse(node, out, stack);
            }
            "field_access" => {
                if let Some(field) = node.child_by_field_name("field") {
                    let name = self.node_text(field).to_string();
                    out.references.push(RawReference {
                        kind: ReferenceKind::Use,
                        name: name.clone(),
                        detail: name,
                        line: node.start_position().row + 1,
                        container: stack.last().copied(),
                    });
                }
                self.recurse(node, out, stack);
            }
            _ => self.recurse(node, out, stack),
        }
    }

    // -- Rust ------------------------------------------------------------

    fn visit_rust(&self, node: Node, out: &mut FileExtraction, stack: &mut Vec<usize>) {
        match node.kind() {
            "function_item" => {
                let kind = match stack.last().map(|&i| out.symbols[i].kind) {
                    Some(SymbolKind::Class) => SymbolKind::Method,
                    _ => SymbolKind::Function,
                };
                let idx = self.push_symbol(node, kind, out, stack);
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "struct_item" | "enum_item" | "union_item" => {
                self.push_symbol(node, SymbolKind::Class, out, stack);
                self.recurse(node, out, stack);
            }
            "trait_item" => {
                let idx = self.push_symbol(node, SymbolKind::Class, out, stack);
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "mod_item" => {
                let idx = self.push_symbol(node, SymbolKind::Module, out, stack);
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "impl_item" => {
                // Methods hang off the impl target when it is declared in
                // this file; otherwise they stay free functions.
                let target = node
                    .child_by_field_name("type")
                    .map(|t| last_segment(self.node_text(t)));
                let target_idx = target.as_deref().and_then(|name| {
                    out.symbols
                        .iter()
                        .position(|s| s.kind == SymbolKind::Class && s.name == name)
                });
                if let Some(idx) = target_idx {
                    stack.push(idx);
                    self.recurse(node, out, stack);
                    stack.pop();
                } else {
                    self.recurse(node, out, stack);
                }
            }
            "const_item" | "static_item" => {
                self.push_symbol(node, SymbolKind::Variable, out, stack);
            }
            "use_declaration" => {
                let text = self.node_text(node).trim().to_string();
                let module = text
                    .trim_start_matches("use")
                    .trim()
                    .trim_end_matches(';')
                    .trim()
                    .to_string();
                self.push_import(node, &module, &text, out, stack);
            }
            "call_expression" => {
                if let Some(func) = node.child_by_field_name("function") {
                    let detail = self.node_text(func).to_string();
                    out.references.push(RawReference {
                        kind: ReferenceKind::Call,
                        name: last_segment(&detail),
                        detail,
                        line: node.start_position().row + 1,
                        container: stack.last().copied(),
                    });
                }
                self.recurse(node, out, stack);
            }
            "type_identifier" => {
                // Skip the name node of the declaration itself
                let is_decl_name = node
                    .parent()
                    .and_then(|p| p.child_by_field_name("name"))
                    .is_some_and(|n| n == node);
                if !is_decl_name && !stack.is_empty() {
                    let name = self.node_text(node).to_string();
                    out.references.push(RawReference {
                        kind: ReferenceKind::Use,
                        name: name.clone(),
                        detail: name,
                        line: node.start_position().row + 1,
                        container: stack.last().copied(),
                    });
                }
            }
            _ => self.recurse(node, out, stack),
        }
    }

    // -- JavaScript / TypeScript -----------------------------------------

    fn visit_js(&self, node: Node, out: &mut FileExtraction, stack: &mut Vec<usize>) {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                let idx = self.push_symbol(node, SymbolKind::Function, out, stack);
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "class_declaration" => {
                let idx = self.push_symbol(node, SymbolKind::Class, out, stack);
                for heritage in self.children_of_kind(node, "class_heritage") {
                    for base in self.collect_names(heritage, &["identifier", "member_expression"])
                    {
                        out.references.push(RawReference {
                            kind: ReferenceKind::Inherit,
                            name: last_segment(&base),
                            detail: base,
                            line: node.start_position().row + 1,
                            container: Some(idx),
                        });
                    }
                }
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "method_definition" => {
                let idx = self.push_symbol(node, SymbolKind::Method, out, stack);
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "interface_declaration" | "enum_declaration" => {
                let idx = self.push_symbol(node, SymbolKind::Class, out, stack);
                stack.push(idx);
                self.recurse(node, out, stack);
                stack.pop();
            }
            "lexical_declaration" | "variable_declaration" if stack.is_empty() => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "variable_declarator" {
                        if let Some(name) = child.child_by_field_name("name") {
                            if name.kind() == "identifier" {
                                out.symbols.push(SymbolRecord {
                                    kind: SymbolKind::Variable,
                                    name: self.node_text(name).to_string(),
                                    signature: self.signature(node),
                                    container: None,
                                    line_start: node.start_position().row + 1,
                                    line_end: node.end_position().row + 1,
                                });
                            }
                        }
                    }
                }
                self.recurse(node, out, stack);
            }
            "import_statement" => {
                let text = self.node_text(node).trim().to_string();
                let module = node
                    .child_by_field_name("source")
                    .map(|s| self.node_text(s).trim_matches(['"', '\'']).to_string())
                    .unwrap_or_default();
                self.push_import(node, &module, &text, out, stack);
            }
            "call_expression" => {
                if let Some(func) = node.child_by_field_name("function") {
                    let detail = self.node_text(func).to_string();
                    out.references.push(RawReference {
                        kind: ReferenceKind::Call,
                        name: last_segment(&detail),
                        detail,
                        line: node.start_position().row + 1,
                        container: stack.last().copied(),
                    });
                }
                self.recurse(node, out, stack);
            }
            _ => self.recurse(node, out, stack),
        }
    }

    // -- shared helpers --------------------------------------------------

    fn node_text(&self, node: Node) -> &'s str {
        &self.source[node.byte_range()]
    }

    /// Append a named declaration; returns its index in the symbol list
    fn push_symbol(
        &self,
        node: Node,
        kind: SymbolKind,
        out: &mut FileExtraction,
        stack: &[usize],
    ) -> usize {
        let name = self
            .declared_name(node)
            .unwrap_or_else(|| "<anonymous>".to_string());
        out.symbols.push(SymbolRecord {
            kind,
            name,
            signature: self.signature(node),
            container: stack.last().copied(),
            line_start: node.start_position().row + 1,
            line_end: node.end_position().row + 1,
        });
        out.symbols.len() - 1
    }

    /// Record an import both as a symbol and as a raw reference for the
    /// file-level resolution pass
    fn push_import(
        &self,
        node: Node,
        module: &str,
        text: &str,
        out: &mut FileExtraction,
        stack: &[usize],
    ) {
        if module.is_empty() {
            return;
        }
        out.symbols.push(SymbolRecord {
            kind: SymbolKind::Import,
            name: module.to_string(),
            signature: None,
            container: stack.last().copied(),
            line_start: node.start_position().row + 1,
            line_end: node.end_position().row + 1,
        });
        out.references.push(RawReference {
            kind: ReferenceKind::Import,
            name: module.to_string(),
            detail: text.to_string(),
            line: node.start_position().row + 1,
            container: None,
        });
    }

    /// Name of a declaration: the `name` field when present, otherwise the
    /// first identifier-like child
    fn declared_name(&self, node: Node) -> Option<String> {
        if let Some(name) = node.child_by_field_name("name") {
            return Some(self.node_text(name).to_string());
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(
                child.kind(),
                "identifier" | "type_identifier" | "field_identifier" | "property_identifier"
            ) {
                return Some(self.node_text(child).to_string());
            }
        }
        None
    }

    /// First line of the declaration, bounded
    fn signature(&self, node: Node) -> Option<String> {
        let text = self.node_text(node);
        let mut line = text.lines().next().unwrap_or("").trim().to_string();
        if line.is_empty() {
            return None;
        }
        if line.len() > MAX_SIGNATURE_CHARS {
            let cut = line
                .char_indices()
                .take_while(|(i, _)| *i < MAX_SIGNATURE_CHARS)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            line.truncate(cut);
        }
        Some(line)
    }

    /// Whether a function nested at the current position is a method
    fn nested_function_kind(&self, out: &FileExtraction, stack: &[usize]) -> SymbolKind {
        match stack.last().map(|&i| out.symbols[i].kind) {
            Some(SymbolKind::Class) => SymbolKind::Method,
            _ => SymbolKind::Function,
        }
    }

    /// Collect the text of descendant nodes matching the given kinds
    fn collect_names(&self, node: Node, kinds: &[&str]) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names_into(node, kinds, &mut names);
        names
    }

    fn collect_names_into(&self, node: Node, kinds: &[&str], names: &mut Vec<String>) {
        if kinds.contains(&node.kind()) {
            names.push(self.node_text(node).to_string());
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_names_into(child, kinds, names);
        }
    }

    fn children_of_kind<'t>(&self, node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .filter(|c| c.kind() == kind)
            .collect()
    }
}

/// Last segment of a dotted or path-qualified name, generics stripped
pub fn last_segment(text: &str) -> String {
    let trimmed = text.trim();
    let base = trimmed.split(['<', '(']).next().unwrap_or(trimmed);
    let after_colons = base.rsplit("::").next().unwrap_or(base);
    let after_dots = after_colons.rsplit('.').next().unwrap_or(after_colons);
    after_dots.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(language: Language, path: &str, source: &str) -> FileExtraction {
        let mut extractor = FileExtractor::new(language).unwrap();
        extractor.extract(path, source).unwrap()
    }

    #[test]
    fn test_python_symbols_and_references() {
        let source = r#"
import os
from helpers import fmt

LIMIT = 10

class Greeter(Base):
    def greet(self, name):
        return fmt(name)

def main():
    g = Greeter()
    g.greet("world")
"#;
        let ex = extract(Language::Python, "app.py", source);

        let names: Vec<_> = ex.symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Greeter"));
        assert!(names.contains(&"greet"));
        assert!(names.contains(&"main"));
        assert!(names.contains(&"LIMIT"));

        let greet = ex.symbols.iter().find(|s| s.name == "greet").unwrap();
        assert_eq!(greet.kind, SymbolKind::Method);
        let main = ex.symbols.iter().find(|s| s.name == "main").unwrap();
        assert_eq!(main.kind, SymbolKind::Function);
        let limit = ex.symbols.iter().find(|s| s.name == "LIMIT").unwrap();
        assert_eq!(limit.kind, SymbolKind::Variable);

        let imports: Vec<_> = ex
            .references
            .iter()
            .filter(|r| r.kind == ReferenceKind::Import)
            .map(|r| r.name.as_str())
            .collect();
        assert!(imports.contains(&"os"));
        assert!(imports.contains(&"helpers"));

        assert!(ex
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::Call && r.name == "fmt"));
        assert!(ex
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::Inherit && r.name == "Base"));
    }

    #[test]
    fn test_python_symbols_in_declaration_order() {
        let source = "def first():\n    pass\n\ndef second():\n    pass\n";
        let ex = extract(Language::Python, "mod.py", source);
        let funcs: Vec<_> = ex
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Function)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(funcs, vec!["first", "second"]);
    }

    #[test]
    fn test_java_symbols_and_references() {
        let source = r#"
import com.example.util.Text;

public class Greeter extends Base {
    private int count;

    public String greet(String name) {
        return Text.format(name);
    }
}
"#;
        let ex = extract(Language::Java, "Greeter.java", source);

        let class = ex.symbols.iter().find(|s| s.name == "Greeter").unwrap();
        assert_eq!(class.kind, SymbolKind::Class);
        let method = ex.symbols.iter().find(|s| s.name == "greet").unwrap();
        assert_eq!(method.kind, SymbolKind::Method);
        let field = ex.symbols.iter().find(|s| s.name == "count").unwrap();
        assert_eq!(field.kind, SymbolKind::Variable);

        assert!(ex
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::Import && r.name == "com.example.util.Text"));
        assert!(ex
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::Inherit && r.name == "Base"));
        assert!(ex
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::Call && r.name == "format"));
    }

    #[test]
    fn test_rust_symbols_and_references() {
        let source = r#"
use crate::io::reader;

pub struct Point {
    x: i32,
}

impl Point {
    pub fn origin() -> Self {
        helper()
    }
}

fn helper() -> Point {
    Point { x: 0 }
}
"#;
        let ex = extract(Language::Rust, "src/point.rs", source);

        let point = ex.symbols.iter().find(|s| s.name == "Point").unwrap();
        assert_eq!(point.kind, SymbolKind::Class);
        let origin = ex.symbols.iter().find(|s| s.name == "origin").unwrap();
        assert_eq!(origin.kind, SymbolKind::Method);
        let helper = ex.symbols.iter().find(|s| s.name == "helper").unwrap();
        assert_eq!(helper.kind, SymbolKind::Function);

        assert!(ex
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::Import && r.name == "crate::io::reader"));
        assert!(ex
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::Call && r.name == "helper"));
    }

    #[test]
    fn test_typescript_symbols() {
        let source = r#"
import { fmt } from "./util";

export class Widget extends Base {
    render(): string {
        return fmt(this.label);
    }
}

function mount() {
    new Widget();
}
"#;
        let ex = extract(Language::TypeScript, "widget.ts", source);

        let widget = ex.symbols.iter().find(|s| s.name == "Widget").unwrap();
        assert_eq!(widget.kind, SymbolKind::Class);
        let render = ex.symbols.iter().find(|s| s.name == "render").unwrap();
        assert_eq!(render.kind, SymbolKind::Method);

        assert!(ex
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::Import && r.name == "./util"));
        assert!(ex
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::Inherit && r.name == "Base"));
    }

    #[test]
    fn test_method_container_points_at_class_record() {
        let source = "class A:\n    def m(self):\n        pass\n";
        let ex = extract(Language::Python, "a.py", source);
        let class_idx = ex.symbols.iter().position(|s| s.name == "A").unwrap();
        let method = ex.symbols.iter().find(|s| s.name == "m").unwrap();
        assert_eq!(method.container, Some(class_idx));
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("a.b.c"), "c");
        assert_eq!(last_segment("crate::io::reader"), "reader");
        assert_eq!(last_segment("plain"), "plain");
        assert_eq!(last_segment("Vec<u8>"), "Vec");
        assert_eq!(last_segment("self.helper.run"), "run");
    }

    #[test]
    fn test_registry_supported_languages() {
        let registry = ExtractorRegistry::new();
        assert!(registry.supports(Language::Python));
        assert!(registry.supports(Language::Java));
        assert!(!registry.supports(Language::Unknown));
        assert!(registry.extractor(Language::Unknown).is_err());
    }
}

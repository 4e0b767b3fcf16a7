//! Go import extraction using Tree-sitter.

use tree_sitter::{Language, Node, Parser};

/// Imports and package clause of one Go source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoFileImports {
    /// Package name from the `package` clause, if present.
    pub package: Option<String>,
    /// Import paths in source order.
    pub imports: Vec<String>,
}

/// Errors raised while parsing Go source.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The grammar could not be loaded into the parser.
    #[error("failed to load Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    /// The parser produced no tree.
    #[error("parser returned no syntax tree")]
    NoTree,
}

/// Extracts import paths from Go source.
pub struct GoExtractor {
    language: Language,
}

impl GoExtractor {
    /// Creates a new Go extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
        node.utf8_text(src).unwrap_or("")
    }

    fn extract_package(node: &Node<'_>, src: &[u8]) -> Option<String> {
        let mut cursor = node.walk();
        let name = node
            .children(&mut cursor)
            .find(|child| child.kind() == "package_identifier")
            .map(|child| Self::text(&child, src).to_owned());
        name
    }

    /// Walks an `import_declaration` or `import_spec_list`.
    fn collect_imports(node: &Node<'_>, src: &[u8], out: &mut Vec<String>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "import_spec" => {
                    if let Some(path) = Self::import_path(&child, src) {
                        out.push(path);
                    }
                }
                "import_spec_list" => Self::collect_imports(&child, src, out),
                _ => {}
            }
        }
    }

    fn import_path(spec: &Node<'_>, src: &[u8]) -> Option<String> {
        let literal = spec.child_by_field_name("path")?;
        let path = Self::text(&literal, src).trim_matches(|c| c == '"' || c == '`');
        (!path.is_empty()).then(|| path.to_owned())
    }

    /// Extracts the package clause and all import paths from `source`.
    ///
    /// # Errors
    ///
    /// Returns error if the parser cannot be set up or yields no tree.
    pub fn extract(&self, source: &str) -> Result<GoFileImports, ExtractError> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;

        let src = source.as_bytes();
        let tree = parser.parse(src, None).ok_or(ExtractError::NoTree)?;
        let root = tree.root_node();

        let mut result = GoFileImports::default();
        let mut cursor = root.walk();
        for node in root.children(&mut cursor) {
            match node.kind() {
                "package_clause" => result.package = Self::extract_package(&node, src),
                "import_declaration" => Self::collect_imports(&node, src, &mut result.imports),
                _ => {}
            }
        }

        Ok(result)
    }
}

impl Default for GoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

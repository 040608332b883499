//! Rule table model and document parsing.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use crate::{Result, RuleError};

/// A `from` directory and the destination template it is redirected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    /// Top-level directory name inside the package `content` folder
    pub from: String,
    /// Application-relative destination, may contain `{ver}`
    pub to: String,
}

impl PathMapping {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// All path mappings declared for one package id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRule {
    pub id: String,
    #[serde(default)]
    pub paths: Vec<PathMapping>,
}

impl PackageRule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            paths: Vec::new(),
        }
    }

    pub fn with_path(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.paths.push(PathMapping::new(from, to));
        self
    }

    /// Find the mapping for a content directory (case-insensitive).
    pub fn mapping(&self, dir_name: &str) -> Option<&PathMapping> {
        self.paths.iter().find(|p| eq_ignore_case(&p.from, dir_name))
    }
}

/// Ordered, read-only table of package rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRules {
    #[serde(default)]
    packages: Vec<PackageRule>,
}

impl MappingRules {
    /// Build a table, rejecting duplicate package ids or duplicate `from` entries.
    pub fn new(packages: Vec<PackageRule>) -> Result<Self> {
        let rules = Self { packages };
        rules.check()?;
        Ok(rules)
    }

    pub fn packages(&self) -> &[PackageRule] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Find the rule for a package id (case-insensitive).
    pub fn package(&self, package_id: &str) -> Option<&PackageRule> {
        self.packages.iter().find(|p| eq_ignore_case(&p.id, package_id))
    }

    /// Find the mapping for a package's content directory.
    pub fn mapping(&self, package_id: &str, dir_name: &str) -> Option<&PathMapping> {
        self.package(package_id)?.mapping(dir_name)
    }

    /// Load a rule document from disk.
    ///
    /// Documents ending in `.json` are read as JSON, anything else as XML.
    /// A missing document yields an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(RuleError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let parsed = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_xml_str(&content)
        };

        parsed.map_err(|e| e.in_document(path))
    }

    /// Parse a JSON rule document: `{"packages": [{"id": .., "paths": [{"from": .., "to": ..}]}]}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rules: MappingRules =
            serde_json::from_str(json).map_err(|e| RuleError::malformed(e.to_string()))?;
        rules.check()?;
        Ok(rules)
    }

    /// Parse an XML rule document.
    ///
    /// ```xml
    /// <rules>
    ///   <package id="Foo">
    ///     <path from="content" to="~/CustomRoot/{ver}" />
    ///   </package>
    /// </rules>
    /// ```
    ///
    /// The names of the root and package elements are not significant.
    pub fn from_xml_str(xml: &str) -> Result<Self> {
        let packages = XmlRuleParser::default()
            .parse(xml)
            .map_err(RuleError::malformed)?;
        Self::new(packages)
    }

    fn check(&self) -> Result<()> {
        for (index, package) in self.packages.iter().enumerate() {
            if package.id.trim().is_empty() {
                return Err(RuleError::malformed(format!(
                    "package rule #{} has an empty id",
                    index + 1
                )));
            }

            if self.packages[..index]
                .iter()
                .any(|earlier| eq_ignore_case(&earlier.id, &package.id))
            {
                return Err(RuleError::malformed(format!(
                    "duplicate rule for package '{}'",
                    package.id
                )));
            }

            for (path_index, mapping) in package.paths.iter().enumerate() {
                if mapping.from.trim().is_empty() {
                    return Err(RuleError::malformed(format!(
                        "package '{}' has a path mapping without 'from'",
                        package.id
                    )));
                }
                if package.paths[..path_index]
                    .iter()
                    .any(|earlier| eq_ignore_case(&earlier.from, &mapping.from))
                {
                    return Err(RuleError::malformed(format!(
                        "package '{}' maps '{}' more than once",
                        package.id, mapping.from
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Case-insensitive comparison for ids and directory names.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Streaming parser for the XML rule document.
///
/// Depth 1 is the root, depth 2 a package rule, depth 3 its `path` elements.
#[derive(Default)]
struct XmlRuleParser {
    packages: Vec<PackageRule>,
    current: Option<PackageRule>,
    depth: usize,
    seen_root: bool,
}

impl XmlRuleParser {
    fn parse(mut self, xml: &str) -> std::result::Result<Vec<PackageRule>, String> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            let event = reader
                .read_event()
                .map_err(|e| format!("at position {}: {}", reader.error_position(), e))?;

            match event {
                Event::Start(e) => {
                    self.depth += 1;
                    self.open(&e)?;
                }
                Event::Empty(e) => {
                    self.depth += 1;
                    self.open(&e)?;
                    self.close();
                }
                Event::End(_) => self.close(),
                Event::Eof => break,
                _ => {}
            }
        }

        if !self.seen_root {
            return Err("document has no root element".to_string());
        }
        if self.depth != 0 {
            return Err("unexpected end of document".to_string());
        }

        Ok(self.packages)
    }

    fn open(&mut self, element: &BytesStart<'_>) -> std::result::Result<(), String> {
        match self.depth {
            1 => {
                if self.seen_root {
                    return Err("document has more than one root element".to_string());
                }
                self.seen_root = true;
            }
            2 => {
                let id = attribute(element, "id")?.ok_or_else(|| {
                    format!(
                        "element <{}> has no 'id' attribute",
                        String::from_utf8_lossy(element.name().as_ref())
                    )
                })?;
                self.current = Some(PackageRule::new(id));
            }
            3 if element.name().as_ref() == b"path" => {
                let from = attribute(element, "from")?;
                let to = attribute(element, "to")?;
                let (Some(from), Some(to)) = (from, to) else {
                    return Err("<path> requires both 'from' and 'to' attributes".to_string());
                };
                if let Some(package) = self.current.as_mut() {
                    package.paths.push(PathMapping::new(from, to));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.depth == 2 {
            if let Some(package) = self.current.take() {
                self.packages.push(package);
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> std::result::Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

//! Raw `pom.xml` reading.
//!
//! This is the lightweight descriptor model used for module-graph discovery:
//! coordinates, parent/module declarations, properties, and profile ids.
//! Full dependency-coordinate resolution is the descriptor parser
//! collaborator's job, not this module's.

use regex::Regex;
use reweave_core::resource::Resource;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

pub const BUILD_FILE_NAME: &str = "pom.xml";

/// Errors reading a single build descriptor.
#[derive(Debug, thiserror::Error)]
pub enum PomError {
    #[error("failed to read descriptor {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("malformed descriptor {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("descriptor {path} has no resolvable coordinates")]
    MissingCoordinates { path: PathBuf },
}

/// A `<parent>` declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomParent {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub relative_path: Option<String>,
}

/// Resolved module coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// The declarations read from one `pom.xml`.
#[derive(Debug, Clone, Default)]
pub struct RawPom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<PomParent>,
    pub modules: Vec<String>,
    pub properties: BTreeMap<String, String>,
    pub profiles: Vec<String>,
}

impl RawPom {
    /// Read the declarations from a descriptor resource.
    pub fn parse(resource: &Resource) -> Result<Self, PomError> {
        let bytes = resource.bytes().map_err(|source| PomError::Read {
            path: resource.path().to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let doc = roxmltree::Document::parse(&text).map_err(|source| PomError::Xml {
            path: resource.path().to_path_buf(),
            source,
        })?;

        let project = doc.root_element();
        let mut pom = RawPom {
            group_id: child_text(&project, "groupId"),
            artifact_id: child_text(&project, "artifactId"),
            version: child_text(&project, "version"),
            packaging: child_text(&project, "packaging"),
            ..RawPom::default()
        };

        if let Some(parent_node) = child_element(&project, "parent") {
            pom.parent = Some(PomParent {
                group_id: child_text(&parent_node, "groupId"),
                artifact_id: child_text(&parent_node, "artifactId"),
                version: child_text(&parent_node, "version"),
                relative_path: child_text(&parent_node, "relativePath"),
            });
        }

        if let Some(props_node) = child_element(&project, "properties") {
            for child in props_node.children().filter(|n| n.is_element()) {
                let key = child.tag_name().name().to_string();
                if let Some(value) = child.text().map(str::trim).filter(|t| !t.is_empty()) {
                    pom.properties.insert(key, value.to_string());
                }
            }
        }

        if let Some(modules_node) = child_element(&project, "modules") {
            pom.modules = modules_node
                .children()
                .filter(|n| n.is_element() && n.has_tag_name("module"))
                .filter_map(|n| n.text())
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }

        if let Some(profiles_node) = child_element(&project, "profiles") {
            pom.profiles = profiles_node
                .children()
                .filter(|n| n.is_element() && n.has_tag_name("profile"))
                .filter_map(|n| child_text(&n, "id"))
                .collect();
        }

        Ok(pom)
    }

    /// Coordinates with groupId/version inherited from the parent
    /// declaration where the descriptor omits them.
    pub fn effective_coordinates(&self) -> Option<Coordinates> {
        let parent = self.parent.as_ref();
        let group_id = self
            .group_id
            .clone()
            .or_else(|| parent.and_then(|p| p.group_id.clone()))?;
        let artifact_id = self.artifact_id.clone()?;
        let version = self
            .version
            .clone()
            .or_else(|| parent.and_then(|p| p.version.clone()))?;
        Some(Coordinates {
            group_id,
            artifact_id,
            version,
        })
    }

    pub fn packaging(&self) -> &str {
        self.packaging.as_deref().unwrap_or("jar")
    }

    /// The declared source encoding, with `${...}` placeholders resolved
    /// against the descriptor's own properties.
    pub fn source_encoding(&self) -> Option<String> {
        self.properties
            .get("project.build.sourceEncoding")
            .map(|v| resolve_placeholders(v, &self.properties))
    }

    /// Declared Java language level as (source, target), from
    /// `maven.compiler.release` or `maven.compiler.source`/`target`.
    pub fn java_version(&self) -> Option<(String, String)> {
        if let Some(release) = self.properties.get("maven.compiler.release") {
            return Some((release.clone(), release.clone()));
        }
        let source = self.properties.get("maven.compiler.source");
        let target = self.properties.get("maven.compiler.target");
        match (source, target) {
            (Some(s), Some(t)) => Some((s.clone(), t.clone())),
            (Some(v), None) | (None, Some(v)) => Some((v.clone(), v.clone())),
            (None, None) => None,
        }
    }
}

fn child_element<'a>(
    node: &'a roxmltree::Node<'a, 'a>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: &roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn resolve_placeholders(text: &str, props: &BTreeMap<String, String>) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

    re.replace_all(text, |caps: &regex::Captures<'_>| {
        props
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

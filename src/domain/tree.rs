//! Directory-tree model.
//!
//! Users describe the layout they want as a list of literals:
//!
//! ```yaml
//! folder_struct:
//!   - root:
//!       - src
//!       - main.go
//!       - README.md:
//!           template: { engine: tera, filepath: templates/readme.tpl }
//! ```
//!
//! A bare string is a file when its last path segment has an extension and a
//! folder otherwise. Plugins never see this form: before a filer step runs the
//! tree is flattened into [`WireNode`]s.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a file's content is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDirective {
    /// Registry name of a `template_engine` module.
    pub engine: String,
    /// Template source on the host filesystem.
    pub filepath: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Folder,
}

/// Decide whether a literal names a file or a folder.
///
/// Only the last `/`-separated segment matters; it names a file as soon as it
/// contains a `.` (so `.gitignore` and `Makefile.` are files, `src/cmd` is not).
pub fn classify(name: &str) -> NodeKind {
    let segment = name.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    if segment.contains('.') {
        NodeKind::File
    } else {
        NodeKind::Folder
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum FsNode {
    File {
        name: String,
        template: Option<TemplateDirective>,
        /// Filled by [`populate_content`], never read from user input.
        content: String,
    },
    Folder {
        name: String,
        children: Vec<FsNode>,
    },
}

impl FsNode {
    pub fn file(name: impl Into<String>) -> Self {
        FsNode::File {
            name: name.into(),
            template: None,
            content: String::new(),
        }
    }

    pub fn templated_file(name: impl Into<String>, directive: TemplateDirective) -> Self {
        FsNode::File {
            name: name.into(),
            template: Some(directive),
            content: String::new(),
        }
    }

    pub fn folder(name: impl Into<String>, children: Vec<FsNode>) -> Self {
        FsNode::Folder {
            name: name.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FsNode::File { name, .. } | FsNode::Folder { name, .. } => name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            FsNode::File { .. } => NodeKind::File,
            FsNode::Folder { .. } => NodeKind::Folder,
        }
    }

    pub fn to_wire(&self) -> WireNode {
        match self {
            FsNode::File { name, content, .. } => WireNode {
                is_folder: false,
                name: name.clone(),
                content: content.clone(),
                children: Vec::new(),
            },
            FsNode::Folder { name, children } => WireNode {
                is_folder: true,
                name: name.clone(),
                content: String::new(),
                children: flatten(children),
            },
        }
    }
}

/// Literal forms accepted in a workflow file.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawNode {
    Name(String),
    Entry(IndexMap<String, RawBody>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawBody {
    Children(Vec<RawNode>),
    Directive { template: TemplateDirective },
}

impl TryFrom<RawNode> for FsNode {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        match raw {
            RawNode::Name(name) => {
                if name.trim().is_empty() {
                    return Err("empty name in folder_struct".to_string());
                }
                Ok(match classify(&name) {
                    NodeKind::File => FsNode::file(name),
                    NodeKind::Folder => FsNode::folder(name, Vec::new()),
                })
            }
            RawNode::Entry(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "a folder_struct entry must have exactly one key, found {}",
                        map.len()
                    ));
                }
                let Some((name, body)) = map.into_iter().next() else {
                    return Err("empty folder_struct entry".to_string());
                };
                match (classify(&name), body) {
                    (NodeKind::Folder, RawBody::Children(children)) => {
                        let children = children
                            .into_iter()
                            .map(FsNode::try_from)
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(FsNode::folder(name, children))
                    }
                    (NodeKind::File, RawBody::Directive { template }) => {
                        Ok(FsNode::templated_file(name, template))
                    }
                    (NodeKind::File, RawBody::Children(_)) => {
                        Err(format!("'{}' is a file and cannot have children", name))
                    }
                    (NodeKind::Folder, RawBody::Directive { .. }) => Err(format!(
                        "'{}' is a folder and cannot carry a template",
                        name
                    )),
                }
            }
        }
    }
}

impl From<FsNode> for RawNode {
    fn from(node: FsNode) -> Self {
        match node {
            FsNode::File {
                name,
                template: Some(template),
                ..
            } => {
                let mut map = IndexMap::new();
                map.insert(name, RawBody::Directive { template });
                RawNode::Entry(map)
            }
            FsNode::File { name, .. } => RawNode::Name(name),
            FsNode::Folder { name, children } if children.is_empty() => RawNode::Name(name),
            FsNode::Folder { name, children } => {
                let mut map = IndexMap::new();
                map.insert(
                    name,
                    RawBody::Children(children.into_iter().map(RawNode::from).collect()),
                );
                RawNode::Entry(map)
            }
        }
    }
}

/// Plugin-facing shape of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireNode {
    pub is_folder: bool,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<WireNode>,
}

/// Convert a tree into its wire form, keeping declaration order.
pub fn flatten(nodes: &[FsNode]) -> Vec<WireNode> {
    nodes.iter().map(FsNode::to_wire).collect()
}

/// Rebuild a tree from its wire form. Rendering directives are not part of
/// the wire form, so every file comes back without one.
pub fn from_wire(nodes: &[WireNode]) -> Vec<FsNode> {
    nodes
        .iter()
        .map(|node| {
            if node.is_folder {
                FsNode::folder(node.name.clone(), from_wire(&node.children))
            } else {
                FsNode::File {
                    name: node.name.clone(),
                    template: None,
                    content: node.content.clone(),
                }
            }
        })
        .collect()
}

/// What to do when a file's template cannot be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFailurePolicy {
    /// Log, record and leave the file empty.
    #[default]
    Continue,
    /// Stop at the first failure.
    Abort,
}

/// A file whose template could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderFailure {
    /// `/`-joined path from the top of the tree.
    pub path: String,
    pub engine: String,
    pub template: String,
    pub message: String,
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (engine {}, template {}): {}",
            self.path, self.engine, self.template, self.message
        )
    }
}

/// Render every templated file, pre-order and left to right.
///
/// With [`TemplateFailurePolicy::Continue`] all failures are returned and the
/// affected files keep empty content. With [`TemplateFailurePolicy::Abort`] the
/// first failure is returned as the error and the traversal stops there.
pub fn populate_content<F>(
    nodes: &mut [FsNode],
    policy: TemplateFailurePolicy,
    render: &mut F,
) -> Result<Vec<RenderFailure>, RenderFailure>
where
    F: FnMut(&TemplateDirective) -> Result<Vec<u8>, String>,
{
    let mut failures = Vec::new();
    populate_level(nodes, "", policy, render, &mut failures)?;
    Ok(failures)
}

fn populate_level<F>(
    nodes: &mut [FsNode],
    parent: &str,
    policy: TemplateFailurePolicy,
    render: &mut F,
    failures: &mut Vec<RenderFailure>,
) -> Result<(), RenderFailure>
where
    F: FnMut(&TemplateDirective) -> Result<Vec<u8>, String>,
{
    for node in nodes.iter_mut() {
        let path = if parent.is_empty() {
            node.name().to_string()
        } else {
            format!("{}/{}", parent, node.name())
        };
        match node {
            FsNode::File {
                template: Some(directive),
                content,
                ..
            } => match render(&*directive) {
                Ok(bytes) => {
                    *content = String::from_utf8_lossy(&bytes).into_owned();
                }
                Err(message) => {
                    let failure = RenderFailure {
                        path,
                        engine: directive.engine.clone(),
                        template: directive.filepath.clone(),
                        message,
                    };
                    match policy {
                        TemplateFailurePolicy::Abort => return Err(failure),
                        TemplateFailurePolicy::Continue => {
                            tracing::warn!(file = %failure.path, "template render failed: {}", failure.message);
                            failures.push(failure);
                        }
                    }
                }
            },
            FsNode::File { .. } => {}
            FsNode::Folder { children, .. } => {
                populate_level(children, &path, policy, render, failures)?;
            }
        }
    }
    Ok(())
}

use std::fmt;

use thiserror::Error;

/// Lookup key for a node, written `#anchor-id` in panel templates.
/// 節點的查詢鍵，在面板模板中寫作 `#anchor-id`。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector(String);

impl Selector {
    /// Parses a `#id` selector string.
    /// 解析 `#id` 形式的選擇器字串。
    pub fn parse(raw: &str) -> Result<Self, HostError> {
        let trimmed = raw.trim();
        let Some(id) = trimmed.strip_prefix('#') else {
            return Err(HostError::InvalidSelector(trimmed.to_string()));
        };
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(HostError::InvalidSelector(trimmed.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn anchor(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One choice inside a select node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Typed payload of a content node.
/// 內容節點的型別化內容。
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Section { title: String },
    Label(String),
    Text(String),
    Input { label: String, value: String },
    Select {
        label: String,
        options: Vec<SelectOption>,
        selected: Option<usize>,
    },
    Checkbox { label: String, checked: bool },
    Button { label: String, enabled: bool },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Progress { fraction: f32, message: String },
}

impl NodeBody {
    fn kind_name(&self) -> &'static str {
        match self {
            NodeBody::Section { .. } => "section",
            NodeBody::Label(_) => "label",
            NodeBody::Text(_) => "text",
            NodeBody::Input { .. } => "input",
            NodeBody::Select { .. } => "select",
            NodeBody::Checkbox { .. } => "checkbox",
            NodeBody::Button { .. } => "button",
            NodeBody::Table { .. } => "table",
            NodeBody::Progress { .. } => "progress",
        }
    }
}

pub type NodeId = usize;

/// A node in the content tree. Bindings carry the action name a panel
/// registered for the node; assigning a new action replaces the old one.
/// 內容樹中的節點。綁定存放面板為節點註冊的動作名稱；重新指定會取代舊值。
#[derive(Debug, Clone)]
pub struct Node {
    pub anchor: Option<String>,
    pub body: NodeBody,
    pub binding: Option<String>,
    children: Vec<NodeId>,
    detached: bool,
}

impl Node {
    fn from_body(body: NodeBody) -> Self {
        Self {
            anchor: None,
            body,
            binding: None,
            children: Vec::new(),
            detached: false,
        }
    }

    pub fn section(title: impl Into<String>) -> Self {
        Self::from_body(NodeBody::Section {
            title: title.into(),
        })
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::from_body(NodeBody::Label(text.into()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_body(NodeBody::Text(text.into()))
    }

    pub fn input(label: impl Into<String>) -> Self {
        Self::from_body(NodeBody::Input {
            label: label.into(),
            value: String::new(),
        })
    }

    pub fn select(label: impl Into<String>) -> Self {
        Self::from_body(NodeBody::Select {
            label: label.into(),
            options: Vec::new(),
            selected: None,
        })
    }

    pub fn checkbox(label: impl Into<String>) -> Self {
        Self::from_body(NodeBody::Checkbox {
            label: label.into(),
            checked: false,
        })
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self::from_body(NodeBody::Button {
            label: label.into(),
            enabled: true,
        })
    }

    pub fn table() -> Self {
        Self::from_body(NodeBody::Table {
            headers: Vec::new(),
            rows: Vec::new(),
        })
    }

    pub fn progress() -> Self {
        Self::from_body(NodeBody::Progress {
            fraction: 0.0,
            message: String::new(),
        })
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

/// Arena-backed tree the panels mount into. Every mutation bumps `revision`,
/// which is what the bounded anchor wait observes.
/// 面板掛載用的樹狀結構；每次變動都會遞增 `revision`，供限時等待觀察。
#[derive(Debug, Default)]
pub struct ContentHost {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    revision: u64,
}

impl ContentHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Inserts a node under `parent` (or as a root) and returns its id.
    /// Anchors must stay unique for the host's lifetime.
    /// 將節點插入 `parent` 之下（或作為根節點）並回傳其 id；anchor 必須唯一。
    pub fn insert(&mut self, parent: Option<NodeId>, node: Node) -> Result<NodeId, HostError> {
        if let Some(anchor) = &node.anchor {
            if self.find_anchor(anchor).is_some() {
                return Err(HostError::DuplicateAnchor(anchor.clone()));
            }
        }
        if let Some(parent_id) = parent {
            if self.live_node(parent_id).is_none() {
                return Err(HostError::NodeMissing(parent_id));
            }
        }

        let id = self.nodes.len();
        self.nodes.push(node);
        match parent {
            Some(parent_id) => self.nodes[parent_id].children.push(id),
            None => self.roots.push(id),
        }
        self.touch();
        Ok(id)
    }

    /// Removes every node from the host.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.touch();
    }

    /// Detaches a subtree; ids of detached nodes stay allocated but invisible.
    /// 卸除子樹；被卸除節點的 id 仍保留但不再可見。
    pub fn detach(&mut self, id: NodeId) -> Result<(), HostError> {
        self.live_node(id).ok_or(HostError::NodeMissing(id))?;
        self.roots.retain(|root| *root != id);
        for node in &mut self.nodes {
            node.children.retain(|child| *child != id);
        }
        self.mark_detached(id);
        self.touch();
        Ok(())
    }

    /// Detaches all children of `id`, keeping the node itself.
    pub fn clear_children(&mut self, id: NodeId) -> Result<(), HostError> {
        self.live_node(id).ok_or(HostError::NodeMissing(id))?;
        let children = std::mem::take(&mut self.nodes[id].children);
        for child in children {
            self.mark_detached(child);
        }
        self.touch();
        Ok(())
    }

    fn mark_detached(&mut self, id: NodeId) {
        let children = self.nodes[id].children.clone();
        self.nodes[id].detached = true;
        for child in children {
            self.mark_detached(child);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.live_node(id)
    }

    fn live_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).filter(|node| !node.detached)
    }

    /// Finds a live node by selector.
    pub fn find(&self, selector: &Selector) -> Option<NodeId> {
        self.find_anchor(selector.anchor())
    }

    fn find_anchor(&self, anchor: &str) -> Option<NodeId> {
        self.nodes.iter().position(|node| {
            !node.detached && node.anchor.as_deref() == Some(anchor)
        })
    }

    /// Like [`find`](Self::find) but failing with a typed error.
    pub fn require(&self, selector: &Selector) -> Result<NodeId, HostError> {
        self.find(selector)
            .ok_or_else(|| HostError::MissingAnchor(selector.clone()))
    }

    pub fn bind(&mut self, id: NodeId, action: impl Into<String>) -> Result<(), HostError> {
        self.live_node(id).ok_or(HostError::NodeMissing(id))?;
        self.nodes[id].binding = Some(action.into());
        self.touch();
        Ok(())
    }

    pub fn action_of(&self, id: NodeId) -> Option<&str> {
        self.live_node(id)?.binding.as_deref()
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), HostError> {
        match self.body_mut(id)? {
            NodeBody::Text(current) | NodeBody::Label(current) => {
                *current = text.into();
                self.touch();
                Ok(())
            }
            other => Err(HostError::wrong_kind(id, "text", other)),
        }
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), HostError> {
        match self.body_mut(id)? {
            NodeBody::Input { value: current, .. } => {
                *current = value.into();
                self.touch();
                Ok(())
            }
            other => Err(HostError::wrong_kind(id, "input", other)),
        }
    }

    pub fn set_options(
        &mut self,
        id: NodeId,
        options: Vec<SelectOption>,
    ) -> Result<(), HostError> {
        match self.body_mut(id)? {
            NodeBody::Select {
                options: current,
                selected,
                ..
            } => {
                *current = options;
                *selected = None;
                self.touch();
                Ok(())
            }
            other => Err(HostError::wrong_kind(id, "select", other)),
        }
    }

    pub fn set_selected(&mut self, id: NodeId, index: Option<usize>) -> Result<(), HostError> {
        match self.body_mut(id)? {
            NodeBody::Select {
                options, selected, ..
            } => {
                if let Some(idx) = index {
                    if idx >= options.len() {
                        return Err(HostError::OptionOutOfRange {
                            node: id,
                            index: idx,
                            len: options.len(),
                        });
                    }
                }
                *selected = index;
                self.touch();
                Ok(())
            }
            other => Err(HostError::wrong_kind(id, "select", other)),
        }
    }

    /// Selects the option whose value matches, returning whether one matched.
    pub fn select_value(&mut self, id: NodeId, value: &str) -> Result<bool, HostError> {
        match self.body_mut(id)? {
            NodeBody::Select {
                options, selected, ..
            } => {
                let index = options.iter().position(|option| option.value == value);
                *selected = index;
                self.touch();
                Ok(index.is_some())
            }
            other => Err(HostError::wrong_kind(id, "select", other)),
        }
    }

    pub fn set_checked(&mut self, id: NodeId, value: bool) -> Result<(), HostError> {
        match self.body_mut(id)? {
            NodeBody::Checkbox { checked, .. } => {
                *checked = value;
                self.touch();
                Ok(())
            }
            other => Err(HostError::wrong_kind(id, "checkbox", other)),
        }
    }

    pub fn set_enabled(&mut self, id: NodeId, value: bool) -> Result<(), HostError> {
        match self.body_mut(id)? {
            NodeBody::Button { enabled, .. } => {
                *enabled = value;
                self.touch();
                Ok(())
            }
            other => Err(HostError::wrong_kind(id, "button", other)),
        }
    }

    pub fn set_table(
        &mut self,
        id: NodeId,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<(), HostError> {
        match self.body_mut(id)? {
            NodeBody::Table {
                headers: current_headers,
                rows: current_rows,
            } => {
                *current_headers = headers;
                *current_rows = rows;
                self.touch();
                Ok(())
            }
            other => Err(HostError::wrong_kind(id, "table", other)),
        }
    }

    pub fn set_progress(
        &mut self,
        id: NodeId,
        fraction: f32,
        message: impl Into<String>,
    ) -> Result<(), HostError> {
        match self.body_mut(id)? {
            NodeBody::Progress {
                fraction: current,
                message: current_message,
            } => {
                *current = fraction.clamp(0.0, 1.0);
                *current_message = message.into();
                self.touch();
                Ok(())
            }
            other => Err(HostError::wrong_kind(id, "progress", other)),
        }
    }

    fn body_mut(&mut self, id: NodeId) -> Result<&mut NodeBody, HostError> {
        match self.nodes.get_mut(id) {
            Some(node) if !node.detached => Ok(&mut node.body),
            _ => Err(HostError::NodeMissing(id)),
        }
    }

    pub fn text_of(&self, id: NodeId) -> Result<&str, HostError> {
        match &self.live_node(id).ok_or(HostError::NodeMissing(id))?.body {
            NodeBody::Text(text) | NodeBody::Label(text) => Ok(text),
            other => Err(HostError::wrong_kind(id, "text", other)),
        }
    }

    pub fn value_of(&self, id: NodeId) -> Result<&str, HostError> {
        match &self.live_node(id).ok_or(HostError::NodeMissing(id))?.body {
            NodeBody::Input { value, .. } => Ok(value),
            other => Err(HostError::wrong_kind(id, "input", other)),
        }
    }

    pub fn selected_value(&self, id: NodeId) -> Result<Option<&str>, HostError> {
        match &self.live_node(id).ok_or(HostError::NodeMissing(id))?.body {
            NodeBody::Select {
                options, selected, ..
            } => Ok(selected
                .and_then(|idx| options.get(idx))
                .map(|option| option.value.as_str())),
            other => Err(HostError::wrong_kind(id, "select", other)),
        }
    }

    pub fn is_checked(&self, id: NodeId) -> Result<bool, HostError> {
        match &self.live_node(id).ok_or(HostError::NodeMissing(id))?.body {
            NodeBody::Checkbox { checked, .. } => Ok(*checked),
            other => Err(HostError::wrong_kind(id, "checkbox", other)),
        }
    }

    /// Live node ids in depth-first render order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        for root in &self.roots {
            self.walk_into(*root, &mut order);
        }
        order
    }

    fn walk_into(&self, id: NodeId, order: &mut Vec<NodeId>) {
        if self.live_node(id).is_none() {
            return;
        }
        order.push(id);
        for child in self.nodes[id].children.clone() {
            self.walk_into(child, order);
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("selector '{0}' is not a valid #id selector")]
    InvalidSelector(String),
    #[error("node {0} does not exist or was detached")]
    NodeMissing(NodeId),
    #[error("no node matches selector {0}")]
    MissingAnchor(Selector),
    #[error("anchor '{0}' is already taken")]
    DuplicateAnchor(String),
    #[error("node {node} is a {actual}, expected {expected}")]
    WrongKind {
        node: NodeId,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("option index {index} out of range for node {node} ({len} options)")]
    OptionOutOfRange {
        node: NodeId,
        index: usize,
        len: usize,
    },
}

impl HostError {
    fn wrong_kind(node: NodeId, expected: &'static str, actual: &NodeBody) -> Self {
        HostError::WrongKind {
            node,
            expected,
            actual: actual.kind_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_requires_hash_prefix() {
        assert!(Selector::parse("#product-select").is_ok());
        assert!(Selector::parse("product-select").is_err());
        assert!(Selector::parse("#").is_err());
        assert!(Selector::parse("#bad space").is_err());
    }

    #[test]
    fn insert_and_find_by_anchor() {
        let mut host = ContentHost::new();
        let section = host.insert(None, Node::section("Ticket")).unwrap();
        let select = host
            .insert(Some(section), Node::select("Product").with_anchor("product-select"))
            .unwrap();
        let selector = Selector::parse("#product-select").unwrap();
        assert_eq!(host.find(&selector), Some(select));
    }

    #[test]
    fn duplicate_anchor_is_rejected() {
        let mut host = ContentHost::new();
        host.insert(None, Node::text("").with_anchor("preview"))
            .unwrap();
        let err = host
            .insert(None, Node::text("").with_anchor("preview"))
            .unwrap_err();
        assert!(matches!(err, HostError::DuplicateAnchor(anchor) if anchor == "preview"));
    }

    #[test]
    fn mutations_bump_revision() {
        let mut host = ContentHost::new();
        let id = host.insert(None, Node::input("Path")).unwrap();
        let before = host.revision();
        host.set_value(id, "/firmware/OM5P").unwrap();
        assert!(host.revision() > before);
        assert_eq!(host.value_of(id).unwrap(), "/firmware/OM5P");
    }

    #[test]
    fn rebinding_replaces_the_action() {
        let mut host = ContentHost::new();
        let id = host.insert(None, Node::button("Create")).unwrap();
        host.bind(id, "create-ticket").unwrap();
        host.bind(id, "create-ticket").unwrap();
        assert_eq!(host.action_of(id), Some("create-ticket"));
    }

    #[test]
    fn detached_subtree_is_invisible() {
        let mut host = ContentHost::new();
        let section = host.insert(None, Node::section("History")).unwrap();
        let row = host
            .insert(Some(section), Node::text("entry").with_anchor("entry"))
            .unwrap();
        host.clear_children(section).unwrap();
        assert!(host.node(row).is_none());
        assert_eq!(host.find(&Selector::parse("#entry").unwrap()), None);
        // The anchor can be reused after its node is gone.
        host.insert(Some(section), Node::text("fresh").with_anchor("entry"))
            .unwrap();
    }

    #[test]
    fn select_value_matches_option() {
        let mut host = ContentHost::new();
        let id = host.insert(None, Node::select("Product")).unwrap();
        host.set_options(
            id,
            vec![
                SelectOption::new("OM5P-AC", "OM5P-AC"),
                SelectOption::new("RB-912", "RB-912"),
            ],
        )
        .unwrap();
        assert!(host.select_value(id, "RB-912").unwrap());
        assert_eq!(host.selected_value(id).unwrap(), Some("RB-912"));
        assert!(!host.select_value(id, "missing").unwrap());
        assert_eq!(host.selected_value(id).unwrap(), None);
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let mut host = ContentHost::new();
        let id = host.insert(None, Node::button("Send")).unwrap();
        let err = host.set_value(id, "oops").unwrap_err();
        assert!(matches!(
            err,
            HostError::WrongKind {
                expected: "input",
                actual: "button",
                ..
            }
        ));
    }

    #[test]
    fn walk_yields_depth_first_order() {
        let mut host = ContentHost::new();
        let section = host.insert(None, Node::section("A")).unwrap();
        let child = host.insert(Some(section), Node::label("B")).unwrap();
        let sibling = host.insert(None, Node::section("C")).unwrap();
        assert_eq!(host.walk(), vec![section, child, sibling]);
    }
}

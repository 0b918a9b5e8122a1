//! In-memory page used by the form and bot tests.
//!
//! Understands just enough CSS for the selectors the crate builds: `tag`,
//! `#id`, `[attr="value"]`, `tag[attr="value"]`, and comma-separated lists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::browser::{BrowserError, BrowserPage, SelectBy};

#[derive(Debug, Clone, Default)]
pub struct MockNode {
    tag: String,
    attrs: HashMap<String, String>,
    text: String,
    enclosing_label: Option<String>,
    required: bool,
    visible: bool,
    broken: bool,
    options: Vec<(String, String)>,
    value: String,
    checked: bool,
    files: Vec<PathBuf>,
}

impl MockNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            visible: true,
            ..Default::default()
        }
    }

    pub fn input(input_type: &str) -> Self {
        Self::new("input").attr("type", input_type)
    }

    pub fn textarea() -> Self {
        Self::new("textarea")
    }

    /// `(label, value)` pairs.
    pub fn select(options: &[(&str, &str)]) -> Self {
        let mut node = Self::new("select");
        node.options = options
            .iter()
            .map(|(l, v)| (l.to_string(), v.to_string()))
            .collect();
        node
    }

    pub fn label_for(for_id: &str, text: &str) -> Self {
        Self::new("label").attr("for", for_id).text(text)
    }

    pub fn button(text: &str) -> Self {
        Self::new("button").text(text)
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_string(), value.to_string());
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn name(self, name: &str) -> Self {
        self.attr("name", name)
    }

    pub fn placeholder(self, placeholder: &str) -> Self {
        self.attr("placeholder", placeholder)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn wrapped_in_label(mut self, text: &str) -> Self {
        self.enclosing_label = Some(text.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Every read on this node fails, as a detached element would.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    fn type_property(&self) -> String {
        match self.tag.as_str() {
            "textarea" => "textarea".to_string(),
            "select" => "select-one".to_string(),
            _ => self
                .attrs
                .get("type")
                .cloned()
                .unwrap_or_else(|| "text".to_string()),
        }
    }

    fn matches(&self, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .any(|simple| self.matches_simple(simple))
    }

    fn matches_simple(&self, simple: &str) -> bool {
        let tag_end = simple
            .find(|c: char| c == '#' || c == '[')
            .unwrap_or(simple.len());
        let (tag, rest) = simple.split_at(tag_end);
        if !tag.is_empty() && tag != self.tag {
            return false;
        }
        if let Some(id) = rest.strip_prefix('#') {
            return self.attrs.get("id").map(String::as_str) == Some(id);
        }
        if let Some(inner) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let Some((key, value)) = inner.split_once('=') else {
                return self.attrs.contains_key(inner);
            };
            let value = value.trim_matches('"');
            return self.attrs.get(key).map(String::as_str) == Some(value);
        }
        rest.is_empty()
    }
}

#[derive(Default)]
pub struct MockPage {
    nodes: Mutex<Vec<MockNode>>,
    disconnected: AtomicBool,
    navigations: Mutex<Vec<String>>,
    clicks: Mutex<Vec<String>>,
    screenshots: Mutex<Vec<PathBuf>>,
}

impl MockPage {
    pub fn new(nodes: Vec<MockNode>) -> Self {
        Self {
            nodes: Mutex::new(nodes),
            ..Default::default()
        }
    }

    /// Simulates a crashed browser: every later call fails fatally.
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.find(selector).map(|n| n.value)
    }

    pub fn is_checked(&self, selector: &str) -> bool {
        self.find(selector).map(|n| n.checked).unwrap_or(false)
    }

    pub fn files_of(&self, selector: &str) -> Vec<PathBuf> {
        self.find(selector).map(|n| n.files).unwrap_or_default()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    /// Text of every clicked element, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.screenshots.lock().unwrap().clone()
    }

    fn find(&self, selector: &str) -> Option<MockNode> {
        self.nodes
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.matches(selector))
            .cloned()
    }

    fn guard(&self) -> Result<(), BrowserError> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(BrowserError::Disconnected("mock page closed".to_string()));
        }
        Ok(())
    }

    fn with_node<T>(
        &self,
        index: usize,
        f: impl FnOnce(&mut MockNode) -> Result<T, BrowserError>,
    ) -> Result<T, BrowserError> {
        self.guard()?;
        let mut nodes = self.nodes.lock().unwrap();
        let node = nodes
            .get_mut(index)
            .ok_or_else(|| BrowserError::NotFound(format!("node #{index}")))?;
        if node.broken {
            return Err(BrowserError::Script("node is detached".to_string()));
        }
        f(node)
    }

    fn with_selector<T>(
        &self,
        selector: &str,
        f: impl FnOnce(&mut MockNode) -> Result<T, BrowserError>,
    ) -> Result<T, BrowserError> {
        self.guard()?;
        let index = self
            .nodes
            .lock()
            .unwrap()
            .iter()
            .position(|n| n.matches(selector))
            .ok_or_else(|| BrowserError::NotFound(selector.to_string()))?;
        self.with_node(index, f)
    }
}

#[async_trait]
impl BrowserPage for MockPage {
    type Element = usize;

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.guard()?;
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn query_one(&self, selector: &str) -> Result<Option<usize>, BrowserError> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<usize>, BrowserError> {
        self.guard()?;
        Ok(self
            .nodes
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, n)| n.matches(selector))
            .map(|(i, _)| i)
            .collect())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.with_selector(selector, |node| match node.tag.as_str() {
            "input" | "textarea" => {
                node.value = text.to_string();
                Ok(())
            }
            other => Err(BrowserError::Script(format!("cannot fill <{other}>"))),
        })
    }

    async fn select_option(&self, selector: &str, by: SelectBy<'_>) -> Result<(), BrowserError> {
        self.with_selector(selector, |node| {
            let found = node.options.iter().find(|(label, value)| match by {
                SelectBy::Label(wanted) => label == wanted,
                SelectBy::Value(wanted) => value == wanted,
            });
            match found {
                Some((_, value)) => {
                    node.value = value.clone();
                    Ok(())
                }
                None => Err(BrowserError::OptionNotFound(by.to_string())),
            }
        })
    }

    async fn check(&self, selector: &str) -> Result<(), BrowserError> {
        self.with_selector(selector, |node| {
            node.checked = true;
            Ok(())
        })
    }

    async fn set_input_files(&self, selector: &str, path: &Path) -> Result<(), BrowserError> {
        self.with_selector(selector, |node| {
            node.files = vec![path.to_path_buf()];
            Ok(())
        })
    }

    async fn click(&self, element: &usize) -> Result<(), BrowserError> {
        let text = self.with_node(*element, |node| Ok(node.text.clone()))?;
        self.clicks.lock().unwrap().push(text);
        Ok(())
    }

    async fn is_visible(&self, element: &usize) -> Result<bool, BrowserError> {
        self.with_node(*element, |node| Ok(node.visible))
    }

    async fn inner_text(&self, element: &usize) -> Result<String, BrowserError> {
        self.with_node(*element, |node| Ok(node.text.clone()))
    }

    async fn get_attribute(&self, element: &usize, name: &str) -> Result<Option<String>, BrowserError> {
        self.with_node(*element, |node| Ok(node.attrs.get(name).cloned()))
    }

    async fn property(&self, element: &usize, name: &str) -> Result<Option<Value>, BrowserError> {
        self.with_node(*element, |node| {
            Ok(match name {
                "type" => Some(Value::from(node.type_property())),
                "required" => Some(Value::from(node.required)),
                "value" => Some(Value::from(node.value.clone())),
                "checked" => Some(Value::from(node.checked)),
                other => node.attrs.get(other).cloned().map(Value::from),
            })
        })
    }

    async fn tag_name(&self, element: &usize) -> Result<String, BrowserError> {
        self.with_node(*element, |node| Ok(node.tag.clone()))
    }

    async fn enclosing_label_text(&self, element: &usize) -> Result<Option<String>, BrowserError> {
        self.with_node(*element, |node| Ok(node.enclosing_label.clone()))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        self.guard()?;
        self.screenshots.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn wait(&self, _millis: u64) {}
}

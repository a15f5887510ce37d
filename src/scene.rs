use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::{
    core::Point,
    model::{ElementKind, EventAction, TimelineEvent},
};

/// One deduplicated scene entity derived from the flat event list.
#[derive(Clone, Debug)]
pub struct SceneItem {
    pub id: String,
    pub kind: ElementKind,
    pub from: Option<Point>,
    pub to: Option<Point>,
    pub path: Option<Vec<Point>>,
    pub duration: Option<f64>,
    pub content: Option<String>,
    pub asset: Option<String>,
    pub children: Vec<String>,
    pub props: BTreeMap<String, serde_json::Value>,
}

impl SceneItem {
    fn new(event: &TimelineEvent) -> Self {
        Self {
            id: event.element_id.clone(),
            kind: event.kind,
            from: event.from,
            to: event.to,
            path: event.path.clone(),
            duration: event.duration,
            content: event.content.clone(),
            asset: event.asset.clone(),
            children: event.children.clone(),
            props: event.props.clone(),
        }
    }

    fn merge(&mut self, event: &TimelineEvent) {
        if self.from.is_none() {
            self.from = event.from;
        }
        if self.to.is_none() {
            self.to = event.to;
        }
        if self.path.is_none() {
            self.path = event.path.clone();
        }
        if self.duration.is_none() {
            self.duration = event.duration;
        }
        if self.content.is_none() {
            self.content = event.content.clone();
        }
        if self.asset.is_none() {
            self.asset = event.asset.clone();
        }
        for child in &event.children {
            if !self.children.contains(child) {
                self.children.push(child.clone());
            }
        }
        for (key, value) in &event.props {
            self.props.insert(key.clone(), value.clone());
        }
    }

    pub fn prop_number(&self, key: &str) -> Option<f64> {
        self.props.get(key).and_then(serde_json::Value::as_f64)
    }

    /// Static placement from the merged `props.x`/`props.y`.
    pub fn static_position(&self) -> Option<Point> {
        match (self.prop_number("x"), self.prop_number("y")) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// Rooted forest of event-declared elements.
///
/// Built in two passes: first the flat event list collapses into one item
/// per element id (appear is the structural base, later animate events
/// merge their fields on top, disappear leaves structure untouched), then
/// group children attach with cycle detection. A child already claimed by
/// an earlier group keeps its first parent; an attachment that would close
/// a cycle is dropped and the render proceeds without it.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    items: Vec<SceneItem>,
    index: BTreeMap<String, usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl SceneGraph {
    pub fn build(events: &[TimelineEvent]) -> Self {
        let mut graph = Self::default();

        for event in events {
            if event.kind == ElementKind::Camera {
                continue;
            }
            match graph.index.get(&event.element_id) {
                Some(&idx) => {
                    if event.action != EventAction::Disappear {
                        graph.items[idx].merge(event);
                    }
                }
                None => {
                    graph.index.insert(event.element_id.clone(), graph.items.len());
                    graph.items.push(SceneItem::new(event));
                }
            }
        }
        graph.parent = vec![None; graph.items.len()];
        graph.children = vec![Vec::new(); graph.items.len()];

        for group in 0..graph.items.len() {
            if graph.items[group].kind != ElementKind::Group {
                continue;
            }
            let child_ids = graph.items[group].children.clone();
            for child_id in child_ids {
                let Some(&child) = graph.index.get(&child_id) else {
                    continue;
                };
                if graph.parent[child].is_some() {
                    tracing::debug!(
                        group = %graph.items[group].id,
                        child = %child_id,
                        "child already attached, keeping first parent"
                    );
                    continue;
                }
                if graph.ancestors_of(group).contains(&child) {
                    tracing::warn!(
                        group = %graph.items[group].id,
                        child = %child_id,
                        "dropping child attachment that would close a cycle"
                    );
                    continue;
                }
                graph.parent[child] = Some(group);
                graph.children[group].push(child);
            }
        }

        graph
    }

    /// The item itself followed by its chain of parents up to a root.
    fn ancestors_of(&self, idx: usize) -> SmallVec<[usize; 8]> {
        let mut chain = SmallVec::new();
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            chain.push(i);
            cursor = self.parent[i];
        }
        chain
    }

    pub fn items(&self) -> &[SceneItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&SceneItem> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn parent_of(&self, idx: usize) -> Option<usize> {
        self.parent[idx]
    }

    pub fn children_of(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    /// Indices never attached as a child, in first-event order.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.items.len()).filter(|&i| self.parent[i].is_none())
    }
}

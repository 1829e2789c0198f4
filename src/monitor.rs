//! Monitoring tree (spec.md §4.K): a `Monitorable` capability composed
//! via `Merger`/`Wrapper`, rendered to the JSON shape in §6.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

pub trait Monitorable: Send + Sync {
    /// This node's own scalar or nested metrics.
    fn own_metrics(&self) -> HashMap<String, Value>;

    /// Named child nodes.
    fn children(&self) -> HashMap<String, Arc<dyn Monitorable>> {
        HashMap::new()
    }

    /// Depth-first JSON rendering: own metrics plus a `children` key,
    /// omitted when there are no children (spec.md §6).
    fn render(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (k, v) in self.own_metrics() {
            obj.insert(k, v);
        }
        let children = self.children();
        if !children.is_empty() {
            let mut child_obj = serde_json::Map::new();
            for (name, child) in children {
                child_obj.insert(name, child.render());
            }
            obj.insert("children".to_string(), Value::Object(child_obj));
        }
        Value::Object(obj)
    }
}

/// Concatenates the own metrics of several `Monitorable`s (last-wins on
/// key collision) and concatenates their children.
pub struct Merger {
    nodes: Vec<Arc<dyn Monitorable>>,
}

impl Merger {
    pub fn new(nodes: Vec<Arc<dyn Monitorable>>) -> Self {
        Self { nodes }
    }
}

impl Monitorable for Merger {
    fn own_metrics(&self) -> HashMap<String, Value> {
        let mut merged = HashMap::new();
        for node in &self.nodes {
            merged.extend(node.own_metrics());
        }
        merged
    }

    fn children(&self) -> HashMap<String, Arc<dyn Monitorable>> {
        let mut merged = HashMap::new();
        for node in &self.nodes {
            merged.extend(node.children());
        }
        merged
    }
}

/// Exposes a prebuilt children map with no own metrics of its own.
pub struct Wrapper {
    children: HashMap<String, Arc<dyn Monitorable>>,
}

impl Wrapper {
    pub fn new(children: HashMap<String, Arc<dyn Monitorable>>) -> Self {
        Self { children }
    }
}

impl Monitorable for Wrapper {
    fn own_metrics(&self) -> HashMap<String, Value> {
        HashMap::new()
    }

    fn children(&self) -> HashMap<String, Arc<dyn Monitorable>> {
        self.children.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf {
        value: i64,
    }

    impl Monitorable for Leaf {
        fn own_metrics(&self) -> HashMap<String, Value> {
            HashMap::from([("count".to_string(), Value::from(self.value))])
        }
    }

    #[test]
    fn leaf_renders_without_children_key() {
        let leaf = Leaf { value: 3 };
        let rendered = leaf.render();
        assert_eq!(rendered["count"], 3);
        assert!(rendered.get("children").is_none());
    }

    #[test]
    fn merger_concatenates_own_metrics_last_wins() {
        let a: Arc<dyn Monitorable> = Arc::new(Leaf { value: 1 });
        let b: Arc<dyn Monitorable> = Arc::new(Leaf { value: 2 });
        let merger = Merger::new(vec![a, b]);
        assert_eq!(merger.own_metrics()["count"], Value::from(2));
    }

    #[test]
    fn wrapper_renders_prebuilt_children() {
        let mut children: HashMap<String, Arc<dyn Monitorable>> = HashMap::new();
        children.insert("worker-0".to_string(), Arc::new(Leaf { value: 7 }));
        let wrapper = Wrapper::new(children);
        let rendered = wrapper.render();
        assert_eq!(rendered["children"]["worker-0"]["count"], 7);
    }

    #[test]
    fn merger_concatenates_childrens_children() {
        let mut left_children: HashMap<String, Arc<dyn Monitorable>> = HashMap::new();
        left_children.insert("a".to_string(), Arc::new(Leaf { value: 1 }));
        let mut right_children: HashMap<String, Arc<dyn Monitorable>> = HashMap::new();
        right_children.insert("b".to_string(), Arc::new(Leaf { value: 2 }));

        let left: Arc<dyn Monitorable> = Arc::new(Wrapper::new(left_children));
        let right: Arc<dyn Monitorable> = Arc::new(Wrapper::new(right_children));
        let merger = Merger::new(vec![left, right]);

        let rendered = merger.render();
        assert_eq!(rendered["children"]["a"]["count"], 1);
        assert_eq!(rendered["children"]["b"]["count"], 2);
    }
}

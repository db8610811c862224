use serde_json::{Map, Value, json};

/// Editor settings as a JSON object tree, addressed with dotted paths
/// (e.g. `geometry.nodeHalfWidth`).
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig(Value);

impl Default for EditorConfig {
    fn default() -> Self {
        default_site_config()
    }
}

/// Built-in defaults every override is merged onto.
pub fn default_site_config() -> EditorConfig {
    EditorConfig(json!({
        "geometry": {
            "nodeHalfWidth": 110.0,
            "nodeHalfHeight": 40.0,
            "anchorMargin": 6.0,
            "curveBow": 30.0,
            "minZoom": 0.4,
            "maxZoom": 2.5
        },
        "graph": {
            "childOffsetX": 80.0,
            "childOffsetY": -80.0
        },
        "render": {
            "boundsPadding": 50.0,
            "canvasWidth": 1200.0,
            "canvasHeight": 800.0,
            "labelFontSize": 14.4,
            "labelLineHeight": 1.35,
            "labelInset": 5.0
        },
        "interaction": {
            "doubleTapMs": 320.0,
            "wheelZoomIn": 1.08,
            "wheelZoomOut": 0.92
        }
    }))
}

impl EditorConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Defaults with `overrides` deep-merged on top.
    pub fn with_overrides(overrides: &Value) -> Self {
        let mut cfg = default_site_config();
        cfg.deep_merge(overrides);
        cfg
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn lookup(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.lookup(dotted_path)?.as_str()
    }

    /// Numeric lookup; non-finite values are treated as absent.
    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        self.lookup(dotted_path)?
            .as_f64()
            .filter(|v| v.is_finite())
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        // Configs are objects; coerce anything else so this API never panics on user input.
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }

        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur.entry(seg).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

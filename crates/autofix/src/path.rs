use serde_json::{Map, Value};

enum Segment {
    Key(String),
    Index(usize),
}

fn parse(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for dot_part in path.split('.') {
        let mut rest = dot_part;
        if let Some(bracket) = rest.find('[') {
            let key = &rest[..bracket];
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            }
            rest = &rest[bracket..];
            while let Some(close) = rest.find(']') {
                let idx_str = &rest[1..close];
                if let Ok(idx) = idx_str.parse::<usize>() {
                    segments.push(Segment::Index(idx));
                }
                rest = &rest[close + 1..];
            }
        } else if !rest.is_empty() {
            segments.push(Segment::Key(rest.to_string()));
        }
    }
    segments
}

fn set(root: &mut Value, segments: &[Segment], value: Value) {
    let Some((first, remainder)) = segments.split_first() else {
        *root = value;
        return;
    };
    match first {
        Segment::Key(key) => {
            if !root.is_object() {
                *root = Value::Object(Map::new());
            }
            let obj = root.as_object_mut().expect("just ensured object");
            let entry = obj.entry(key.clone()).or_insert(Value::Null);
            set(entry, remainder, value);
        }
        Segment::Index(idx) => {
            if !root.is_array() {
                *root = Value::Array(Vec::new());
            }
            let arr = root.as_array_mut().expect("just ensured array");
            while arr.len() <= *idx {
                arr.push(Value::Null);
            }
            set(&mut arr[*idx], remainder, value);
        }
    }
}

/// Returns a copy of `parameters` with `path` (dotted, with `[N]` array
/// indices) set to `value`. Everything else in the tree is preserved.
pub fn with_path_set(parameters: &Map<String, Value>, path: &str, value: Value) -> Map<String, Value> {
    let mut root = Value::Object(parameters.clone());
    set(&mut root, &parse(path), value);
    match root {
        Value::Object(m) => m,
        _ => parameters.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sets_top_level_key() {
        let params = Map::new();
        let out = with_path_set(&params, "url", json!("https://a"));
        assert_eq!(out.get("url").unwrap(), "https://a");
    }

    #[test]
    fn sets_nested_array_index_preserving_siblings() {
        let mut params = Map::new();
        params.insert(
            "fields".into(),
            json!([{ "value": "old0" }, { "value": "old1" }]),
        );
        let out = with_path_set(&params, "fields[1].value", json!("new1"));
        assert_eq!(out["fields"][0]["value"], "old0");
        assert_eq!(out["fields"][1]["value"], "new1");
    }
}

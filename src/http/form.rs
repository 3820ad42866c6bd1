//! `application/x-www-form-urlencoded` envelopes.
//!
//! Keys use bracket nesting: `Header[SessionID]=s1&GetUser[id]=42` decodes to
//! `{"Header":{"SessionID":"s1"},"GetUser":{"id":"42"}}`.
//!
//! - `a[]=x` appends to a list
//! - `a[0]=x` addresses a list item (indices above 20 are plain keys)
//! - a repeated key collects its values into a list
//! - nesting stops at depth 5; the rest of the key is kept as one segment
//!
//! Every value is a string.

use serde_json::{Map, Value};

const MAX_DEPTH: usize = 5;
const MAX_INDEX: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Append,
}

/// Decode a form body into a JSON object.
pub fn decode_form(body: &[u8]) -> Map<String, Value> {
    let mut root = Value::Object(Map::new());
    for (key, value) in url::form_urlencoded::parse(body) {
        if key.is_empty() {
            continue;
        }
        assign(&mut root, &split_key(&key), value.into_owned());
    }
    match root {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn split_key(key: &str) -> Vec<Segment> {
    let (root, mut rest) = match key.find('[') {
        Some(0) | None => return vec![Segment::Key(key.to_string())],
        Some(open) => (&key[..open], &key[open..]),
    };

    let mut segments = vec![Segment::Key(root.to_string())];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else { break };
        if segments.len() > MAX_DEPTH {
            break;
        }
        segments.push(segment(&inner[..close]));
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Key(rest.to_string()));
    }
    segments
}

fn segment(name: &str) -> Segment {
    if name.is_empty() {
        return Segment::Append;
    }
    match name.parse::<usize>() {
        Ok(index) if index <= MAX_INDEX && index.to_string() == name => Segment::Index(index),
        _ => Segment::Key(name.to_string()),
    }
}

fn assign(slot: &mut Value, path: &[Segment], value: String) {
    let Some((head, tail)) = path.split_first() else {
        match slot {
            Value::Null => *slot = Value::String(value),
            Value::Array(items) => items.push(Value::String(value)),
            other => {
                let previous = other.take();
                *other = Value::Array(vec![previous, Value::String(value)]);
            }
        }
        return;
    };

    match head {
        Segment::Key(key) => {
            let map = as_object(slot);
            assign(map.entry(key.clone()).or_insert(Value::Null), tail, value);
        }
        Segment::Append => match slot {
            Value::Object(map) => {
                let key = map.len().to_string();
                assign(map.entry(key).or_insert(Value::Null), tail, value);
            }
            _ => {
                let items = as_array(slot);
                items.push(Value::Null);
                let last = items.len() - 1;
                assign(&mut items[last], tail, value);
            }
        },
        Segment::Index(index) => match slot {
            Value::Object(map) => {
                assign(map.entry(index.to_string()).or_insert(Value::Null), tail, value);
            }
            _ => {
                let items = as_array(slot);
                if *index >= items.len() {
                    items.push(Value::Null);
                }
                let position = (*index).min(items.len() - 1);
                assign(&mut items[position], tail, value);
            }
        },
    }
}

fn as_object(slot: &mut Value) -> &mut Map<String, Value> {
    if !slot.is_object() {
        let mut map = Map::new();
        if let Value::Array(items) = slot.take() {
            for (i, item) in items.into_iter().enumerate() {
                map.insert(i.to_string(), item);
            }
        }
        *slot = Value::Object(map);
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just made an object"),
    }
}

fn as_array(slot: &mut Value) -> &mut Vec<Value> {
    match *slot {
        Value::Array(_) => {}
        Value::Null => *slot = Value::Array(Vec::new()),
        ref mut other => {
            let previous = other.take();
            *other = Value::Array(vec![previous]);
        }
    }
    match slot {
        Value::Array(items) => items,
        _ => unreachable!("slot was just made an array"),
    }
}

//! `application/x-www-form-urlencoded` payloads
//!
//! Keys may use bracket notation: `a[b]=1` nests a mapping, `a[]=1&a[]=2`
//! always builds a sequence. Mixing both under one key gives a mapping in
//! which appended items take the next numeric key (`a[x]=1&a[]=2` is
//! `{"x": "1", "0": "2"}`). A plain key repeated goes through the same
//! sibling grouping as XML elements.

use crate::error::Result;
use crate::value::{Mapping, Sequence, Value};

/// Parse a query string. A leading `?` is ignored; empty input yields an
/// empty mapping.
pub fn parse(input: &str) -> Result<Value> {
    let input = input.trim();
    let input = input.strip_prefix('?').unwrap_or(input);

    let mut result = Mapping::new();
    for (key, value) in form_urlencoded::parse(input.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        let (base, path) = split_key(&key);
        insert_path(&mut result, base, &path, Value::String(value.into_owned()));
    }
    Ok(Value::Mapping(result))
}

/// `a[b][]` -> (`a`, [`b`, ``]); keys with unbalanced brackets are literal
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    let (base, mut rest) = key.split_at(open);
    if base.is_empty() {
        return (key, Vec::new());
    }

    let mut path = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return (key, Vec::new());
        };
        let (segment, tail) = inner.split_at(close);
        path.push(segment);
        rest = tail.get(1..).unwrap_or_default();
    }
    if rest.is_empty() {
        (base, path)
    } else {
        (key, Vec::new())
    }
}

fn insert_path(target: &mut Mapping, key: &str, path: &[&str], value: Value) {
    match path.split_first() {
        None => target.merge_child(key, value),
        Some((&"", tail)) => {
            let item = match tail.split_first() {
                None => value,
                Some((next, rest)) => {
                    let mut nested = Mapping::new();
                    insert_path(&mut nested, next, rest, value);
                    Value::Mapping(nested)
                }
            };
            match target.get_mut(key) {
                Some(Value::Sequence(seq)) => seq.push(item),
                Some(Value::Mapping(map)) => {
                    map.insert(next_index(map).to_string(), item);
                }
                _ => {
                    target.insert(key, Sequence::from(vec![item]));
                }
            }
        }
        Some((next, tail)) => {
            let slot = target
                .0
                .entry(key.to_string())
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            match std::mem::take(slot) {
                Value::Mapping(map) => *slot = Value::Mapping(map),
                // appended items keep their positions as index keys
                Value::Sequence(seq) => {
                    *slot = Value::Mapping(
                        seq.into_iter()
                            .enumerate()
                            .map(|(index, item)| (index.to_string(), item))
                            .collect(),
                    );
                }
                _ => *slot = Value::Mapping(Mapping::new()),
            }
            if let Value::Mapping(child) = slot {
                insert_path(child, next, tail, value);
            }
        }
    }
}

/// One past the largest numeric key, so `[]` after named keys appends
fn next_index(map: &Mapping) -> u64 {
    map.keys()
        .filter_map(|key| key.parse::<u64>().ok())
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_pairs() -> Result<()> {
        let value = parse("?status=123&message=hello+world")?;
        assert_eq!(value.get_path("status"), Some(&Value::from("123")));
        assert_eq!(value.get_path("message"), Some(&Value::from("hello world")));
        Ok(())
    }

    #[test]
    fn test_repeated_keys_group() -> Result<()> {
        let value = parse("d=1&d=2&e=3")?;
        assert_eq!(
            value.get_path("d"),
            Some(&Value::from(vec![Value::from("1"), Value::from("2")]))
        );
        Ok(())
    }

    #[test]
    fn test_bracket_notation() -> Result<()> {
        let value = parse("tags[]=a&user[name]=x&user[roles][]=admin&list[][id]=7&single[]=only")?;
        assert_eq!(value.get_path("tags.0"), Some(&Value::from("a")));
        assert_eq!(value.get_path("user.name"), Some(&Value::from("x")));
        assert_eq!(value.get_path("user.roles.0"), Some(&Value::from("admin")));
        assert_eq!(value.get_path("list.0.id"), Some(&Value::from("7")));
        assert_eq!(
            value.get_path("single").and_then(Value::as_sequence).map(Sequence::len),
            Some(1)
        );
        Ok(())
    }

    #[test]
    fn test_append_after_named_key_keeps_mapping() -> Result<()> {
        let value = parse("a[x]=1&a[]=2&a[]=3")?;
        let keys: Vec<_> = value
            .get_path("a")
            .and_then(Value::as_mapping)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["x", "0", "1"]);
        assert_eq!(value.get_path("a.x"), Some(&Value::from("1")));
        assert_eq!(value.get_path("a.0"), Some(&Value::from("2")));
        assert_eq!(value.get_path("a.1"), Some(&Value::from("3")));
        Ok(())
    }

    #[test]
    fn test_named_key_after_append_keeps_items() -> Result<()> {
        let value = parse("a[]=1&a[]=2&a[x]=3&a[]=4")?;
        assert_eq!(value.get_path("a.0"), Some(&Value::from("1")));
        assert_eq!(value.get_path("a.1"), Some(&Value::from("2")));
        assert_eq!(value.get_path("a.x"), Some(&Value::from("3")));
        assert_eq!(value.get_path("a.2"), Some(&Value::from("4")));
        Ok(())
    }

    #[test]
    fn test_unbalanced_brackets_are_literal() -> Result<()> {
        let value = parse("a[b=1&[c]=2&d[e]f=3")?;
        assert_eq!(value.get_path("a[b"), Some(&Value::from("1")));
        assert!(value.as_mapping().is_some_and(|m| m.contains_key("[c]")));
        assert!(value.as_mapping().is_some_and(|m| m.contains_key("d[e]f")));
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        assert_eq!(parse("")?, Value::Mapping(Mapping::new()));
        Ok(())
    }
}

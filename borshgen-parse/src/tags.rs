//! Field metadata tags.
//!
//! Field metadata lives in the field's doc comment as a mapping from tag
//! name to a quoted, comma-delimited value list:
//!
//! ```text
//! /// bin:"peer_id,uuid" serde:"peerId" enc:""
//! pub peer_id: Uuid,
//! ```
//!
//! Which tags matter, and what the ignore sentinel is, comes from the
//! record's options bundle.

use crate::options::GeneratorOptions;

/// Parsed `name:"value"` pairs from a field's metadata string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    entries: Vec<(String, String)>,
}

impl TagMap {
    /// Parses every `name:"value"` pair out of the given doc lines.
    ///
    /// Text that does not match the pair shape is ordinary documentation and
    /// is skipped.
    #[must_use]
    pub fn parse(doc_lines: &[String]) -> Self {
        let mut entries = Vec::new();
        for line in doc_lines {
            let mut rest = line.trim();
            while let Some(colon) = rest.find(":\"") {
                // Tag name: the identifier running back from the colon.
                let name_start = rest[..colon]
                    .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                    .map_or(0, |i| i + 1);
                let name = &rest[name_start..colon];

                let value_start = colon + 2;
                let Some(value_len) = rest[value_start..].find('"') else {
                    break;
                };
                let value = &rest[value_start..value_start + value_len];
                if !name.is_empty() {
                    entries.push((name.to_string(), value.to_string()));
                }
                rest = &rest[value_start + value_len + 1..];
            }
        }
        Self { entries }
    }

    /// Looks up a tag value by name. First occurrence wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the tag is present at all, value included or not.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// True when no tags were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tag-derived facts about a field, before type resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    /// Wire name from the primary or fallback tag, if either was present.
    pub wire_name: Option<String>,
    /// Field excluded from every generated operation.
    pub ignore: bool,
    /// Field participates in the digest stream.
    pub digest: bool,
    /// Custom-encoder hint (second token of the primary tag value).
    pub encoder_hint: Option<String>,
}

/// Applies the options bundle to a field's tag map.
///
/// The primary tag supplies wire name and encoder hint; the fallback tag
/// only a wire name. Either tag's first token equal to the ignore sentinel
/// excludes the field. The digest tag counts by presence alone.
#[must_use]
pub fn extract_field_tag(tags: &TagMap, options: &GeneratorOptions) -> FieldTag {
    let mut out = FieldTag {
        digest: tags.contains(&options.encode_tag),
        ..FieldTag::default()
    };

    if let Some(value) = tags.get(&options.primary_tag) {
        let mut parts = value.splitn(2, ',');
        let first = parts.next().unwrap_or("").trim();
        if first == options.ignore_sentinel {
            out.ignore = true;
            return out;
        }
        if !first.is_empty() {
            out.wire_name = Some(first.to_string());
        }
        if let Some(hint) = parts.next() {
            let hint = hint.trim();
            if !hint.is_empty() {
                out.encoder_hint = Some(hint.to_string());
            }
        }
        return out;
    }

    if let Some(value) = tags.get(&options.fallback_tag) {
        let first = value.split(',').next().unwrap_or("").trim();
        if first == options.ignore_sentinel {
            out.ignore = true;
            return out;
        }
        if !first.is_empty() {
            out.wire_name = Some(first.to_string());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_pairs() {
        let map = TagMap::parse(&docs(&[r#"bin:"id,uuid" serde:"peerId" enc:"""#]));
        assert_eq!(map.get("bin"), Some("id,uuid"));
        assert_eq!(map.get("serde"), Some("peerId"));
        assert_eq!(map.get("enc"), Some(""));
        assert!(map.contains("enc"));
        assert!(!map.contains("json"));
    }

    #[test]
    fn test_parse_skips_prose() {
        let map = TagMap::parse(&docs(&[
            "Peer identifier, stable across sessions.",
            r#"bin:"peer_id""#,
        ]));
        assert_eq!(map.get("bin"), Some("peer_id"));
        assert_eq!(map.entries.len(), 1);
    }

    #[test]
    fn test_parse_no_tags() {
        let map = TagMap::parse(&docs(&["Just a comment with a colon: nothing else."]));
        assert!(map.is_empty());
    }

    #[test]
    fn test_primary_with_hint() {
        let options = GeneratorOptions::default();
        let map = TagMap::parse(&docs(&[r#"bin:"created,timestamp""#]));
        let tag = extract_field_tag(&map, &options);
        assert_eq!(tag.wire_name.as_deref(), Some("created"));
        assert_eq!(tag.encoder_hint.as_deref(), Some("timestamp"));
        assert!(!tag.ignore);
    }

    #[test]
    fn test_fallback_supplies_name_only() {
        let options = GeneratorOptions::default();
        let map = TagMap::parse(&docs(&[r#"serde:"payload,extra""#]));
        let tag = extract_field_tag(&map, &options);
        assert_eq!(tag.wire_name.as_deref(), Some("payload"));
        assert!(tag.encoder_hint.is_none(), "fallback carries no hint");
    }

    #[test]
    fn test_primary_wins_over_fallback() {
        let options = GeneratorOptions::default();
        let map = TagMap::parse(&docs(&[r#"bin:"a" serde:"b""#]));
        let tag = extract_field_tag(&map, &options);
        assert_eq!(tag.wire_name.as_deref(), Some("a"));
    }

    #[test]
    fn test_ignore_sentinel() {
        let options = GeneratorOptions::default();
        let map = TagMap::parse(&docs(&[r#"bin:"-""#]));
        let tag = extract_field_tag(&map, &options);
        assert!(tag.ignore);
        assert!(tag.wire_name.is_none());
    }

    #[test]
    fn test_ignore_sentinel_on_fallback() {
        let options = GeneratorOptions::default();
        let map = TagMap::parse(&docs(&[r#"serde:"-""#]));
        let tag = extract_field_tag(&map, &options);
        assert!(tag.ignore);
    }

    #[test]
    fn test_digest_presence_with_empty_value() {
        let options = GeneratorOptions::default();
        let map = TagMap::parse(&docs(&[r#"bin:"ts" enc:"""#]));
        let tag = extract_field_tag(&map, &options);
        assert!(tag.digest);
    }

    #[test]
    fn test_digest_survives_ignore() {
        // An ignored field stays ignored even if digest-tagged.
        let options = GeneratorOptions::default();
        let map = TagMap::parse(&docs(&[r#"bin:"-" enc:"""#]));
        let tag = extract_field_tag(&map, &options);
        assert!(tag.ignore);
        assert!(tag.digest);
    }

    #[test]
    fn test_custom_tag_names() {
        let options = GeneratorOptions {
            primary_tag: "msg".to_string(),
            fallback_tag: "json".to_string(),
            encode_tag: "sig".to_string(),
            ..GeneratorOptions::default()
        };
        let map = TagMap::parse(&docs(&[r#"msg:"n" sig:"x""#]));
        let tag = extract_field_tag(&map, &options);
        assert_eq!(tag.wire_name.as_deref(), Some("n"));
        assert!(tag.digest);
    }

    #[test]
    fn test_no_tags_means_defaults() {
        let options = GeneratorOptions::default();
        let tag = extract_field_tag(&TagMap::default(), &options);
        assert!(tag.wire_name.is_none());
        assert!(!tag.ignore);
        assert!(!tag.digest);
    }
}

//! Generator options and the record opt-in directive.
//!
//! A record opts in through a line in its leading documentation whose first
//! token is `borshgen`, optionally followed by flags:
//!
//! ```text
//! /// borshgen -tag=bin -fallback=serde -encode-tag=enc -no-pool
//! ```
//!
//! The parsed flags form the record's options bundle. Flags not present fall
//! back to the invocation-level options (which the CLI may itself have
//! overridden from the defaults).

/// Options bundle governing tag parsing and emission for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Primary field tag name.
    pub primary_tag: String,
    /// Fallback field tag name.
    pub fallback_tag: String,
    /// Ignore sentinel for the chosen tag's first token.
    pub ignore_sentinel: String,
    /// Digest-relevance tag name.
    pub encode_tag: String,
    /// Use pooled scratch buffers in generated `marshal_binary`.
    pub use_pooling: bool,
    /// Emit the zero-copy view type.
    pub zero_copy: bool,
    /// Safe-mode view accessors copy string payloads out of the buffer.
    pub safe_mode: bool,
    /// Advisory cap on string/byte-slice payload length.
    pub max_string_len: usize,
    /// Advisory cap on dynamic slice element counts.
    pub max_slice_len: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            primary_tag: "bin".to_string(),
            fallback_tag: "serde".to_string(),
            ignore_sentinel: "-".to_string(),
            encode_tag: "enc".to_string(),
            use_pooling: true,
            zero_copy: false,
            safe_mode: true,
            max_string_len: 65535,
            max_slice_len: 65535,
        }
    }
}

/// Scans a record's doc lines for the generate marker.
///
/// # Arguments
/// * `doc_lines` - Doc comment lines, outermost first
/// * `base` - Invocation-level options the directive overrides
///
/// # Returns
/// `Some(options)` when a directive line was found, `None` otherwise.
#[must_use]
pub fn parse_directive(doc_lines: &[String], base: &GeneratorOptions) -> Option<GeneratorOptions> {
    for line in doc_lines {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        if parts.next() != Some("borshgen") {
            continue;
        }

        let mut options = base.clone();
        for flag in parts {
            if let Some(value) = flag.strip_prefix("-tag=") {
                options.primary_tag = value.to_string();
            } else if let Some(value) = flag.strip_prefix("-fallback=") {
                options.fallback_tag = value.to_string();
            } else if let Some(value) = flag.strip_prefix("-ignore=") {
                options.ignore_sentinel = value.to_string();
            } else if let Some(value) = flag.strip_prefix("-encode-tag=") {
                options.encode_tag = value.to_string();
            } else if flag == "-no-pool" {
                options.use_pooling = false;
            } else if flag == "-zero-copy" {
                options.zero_copy = true;
            } else if flag == "-unsafe" {
                options.safe_mode = false;
            } else if let Some(value) = flag.strip_prefix("-max-string=") {
                if let Ok(n) = value.parse() {
                    options.max_string_len = n;
                }
            } else if let Some(value) = flag.strip_prefix("-max-slice=") {
                if let Ok(n) = value.parse() {
                    options.max_slice_len = n;
                }
            }
        }
        if options.ignore_sentinel.is_empty() {
            options.ignore_sentinel = "-".to_string();
        }
        return Some(options);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_no_directive() {
        let base = GeneratorOptions::default();
        assert!(parse_directive(&docs(&["An ordinary record."]), &base).is_none());
    }

    #[test]
    fn test_bare_directive_uses_base() {
        let base = GeneratorOptions::default();
        let opts = parse_directive(&docs(&["Event log entry.", "borshgen"]), &base)
            .expect("directive found");
        assert_eq!(opts, base);
    }

    #[test]
    fn test_directive_flags() {
        let base = GeneratorOptions::default();
        let opts = parse_directive(
            &docs(&["borshgen -tag=msg -fallback=json -encode-tag=sig -no-pool -zero-copy"]),
            &base,
        )
        .expect("directive found");
        assert_eq!(opts.primary_tag, "msg");
        assert_eq!(opts.fallback_tag, "json");
        assert_eq!(opts.encode_tag, "sig");
        assert!(!opts.use_pooling);
        assert!(opts.zero_copy);
        assert!(opts.safe_mode);
    }

    #[test]
    fn test_unsafe_flag() {
        let base = GeneratorOptions::default();
        let opts = parse_directive(&docs(&["borshgen -zero-copy -unsafe"]), &base)
            .expect("directive found");
        assert!(opts.zero_copy);
        assert!(!opts.safe_mode);
    }

    #[test]
    fn test_flags_are_order_independent() {
        let base = GeneratorOptions::default();
        let a = parse_directive(&docs(&["borshgen -no-pool -tag=msg"]), &base).expect("a");
        let b = parse_directive(&docs(&["borshgen -tag=msg -no-pool"]), &base).expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn test_directive_not_first_token_is_ignored() {
        let base = GeneratorOptions::default();
        assert!(parse_directive(&docs(&["run borshgen on this"]), &base).is_none());
    }

    #[test]
    fn test_empty_ignore_falls_back_to_dash() {
        let base = GeneratorOptions::default();
        let opts = parse_directive(&docs(&["borshgen -ignore="]), &base).expect("directive");
        assert_eq!(opts.ignore_sentinel, "-");
    }

    #[test]
    fn test_max_string_override() {
        let base = GeneratorOptions::default();
        let opts = parse_directive(&docs(&["borshgen -max-string=32767"]), &base).expect("d");
        assert_eq!(opts.max_string_len, 32767);
    }
}

//! Comment stripping for hand-edited JSON policy files.
//!
//! Removes, outside string literals:
//! - `/* ... */` blocks anywhere (an unterminated block is left as-is)
//! - `// ...` and `# ...` to end of line, when the marker starts a line or
//!   follows whitespace
//!
//! The "follows whitespace" rule keeps tokens like `a//b` intact. Line
//! breaks are preserved so parser error positions still point at the
//! right line.

/// Strip comments from `input`, returning the text to hand to a JSON parser.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some((idx, c)) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                let rest = &input[idx + 2..];
                match rest.find("*/") {
                    Some(end) => {
                        let resume = idx + 2 + end + 2;
                        while matches!(chars.peek(), Some(&(i, _)) if i < resume) {
                            chars.next();
                        }
                    }
                    None => {
                        out.push_str(&input[idx..]);
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '/'))) && at_token_start(&out) => {
                skip_to_line_end(&mut chars);
            }
            '#' if at_token_start(&out) => {
                skip_to_line_end(&mut chars);
            }
            _ => out.push(c),
        }
    }

    out
}

/// True at the start of the text, of a line, or after whitespace.
fn at_token_start(out: &str) -> bool {
    out.chars().next_back().map_or(true, char::is_whitespace)
}

fn skip_to_line_end(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) {
    while let Some(&(_, c)) = chars.peek() {
        if c == '\n' {
            break;
        }
        chars.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_block_comments() {
        let src = "{ /* header\n spans lines */ \"a\": 1 }";
        assert_eq!(strip_comments(src), "{  \"a\": 1 }");
    }

    #[test]
    fn strips_line_comments() {
        let src = "{\n  // note\n  \"a\": 1, # trailing\n  \"b\": 2\n}";
        let stripped = strip_comments(src);
        let v: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(v["a"], 1);
        assert_eq!(v["b"], 2);
        assert_eq!(stripped.lines().count(), src.lines().count());
    }

    #[test]
    fn markers_inside_strings_survive() {
        let src = r#"{"url": "http://x/y", "tag": "a # b", "c": "/* no */", "d": "q\"// z"}"#;
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn marker_glued_to_token_kept() {
        assert_eq!(strip_comments("a//b"), "a//b");
        assert_eq!(strip_comments("x#y"), "x#y");
    }

    #[test]
    fn comment_at_start_of_text() {
        assert_eq!(strip_comments("# title\n{}"), "\n{}");
        assert_eq!(strip_comments("// title\n{}"), "\n{}");
    }

    #[test]
    fn unterminated_block_left_alone() {
        assert_eq!(strip_comments("{} /* open"), "{} /* open");
    }

    #[test]
    fn plain_json_unchanged() {
        let src = "{\n  \"market_filter\": {\"risk_off_breadth_floor\": 0.42}\n}\n";
        assert_eq!(strip_comments(src), src);
    }
}

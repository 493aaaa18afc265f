//! Minimal hand-rolled tokenizer for the NRQL-like domain query language
//! (spec.md §4.5 supplement: "hand-rolled recursive-descent/token-scan
//! validator"). Not a general SQL tokenizer — just enough structure
//! (quote-aware word splitting with byte offsets) for the validator and
//! builder to reason about clause boundaries.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub offset: usize,
}

impl Token {
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.text.eq_ignore_ascii_case(other)
    }
}

/// Splits `input` on whitespace and commas, keeping single- and
/// double-quoted string literals (and parenthesised groups) intact as a
/// single token each. Byte offsets are into the original string.
pub fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == ',' {
            i += 1;
            continue;
        }
        let start = i;
        if c == '\'' || c == '"' {
            let quote = c;
            i += 1;
            while i < bytes.len() && bytes[i] as char != quote {
                i += 1;
            }
            i = (i + 1).min(bytes.len());
        } else if c == '(' {
            let mut depth = 1;
            i += 1;
            while i < bytes.len() && depth > 0 {
                match bytes[i] as char {
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => {}
                }
                i += 1;
            }
        } else {
            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch.is_whitespace() || ch == ',' {
                    break;
                }
                i += 1;
            }
        }
        tokens.push(Token { text: input[start..i].to_string(), offset: start });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace_and_commas() {
        let tokens = tokenize("SELECT a, b FROM Transaction");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["SELECT", "a", "b", "FROM", "Transaction"]);
    }

    #[test]
    fn keeps_quoted_strings_as_one_token() {
        let tokens = tokenize("WHERE name = 'hello, world'");
        assert_eq!(tokens.last().unwrap().text, "'hello, world'");
    }

    #[test]
    fn offsets_point_into_the_original_string() {
        let tokens = tokenize("SELECT * FORM Transaction");
        let form = tokens.iter().find(|t| t.text == "FORM").unwrap();
        assert_eq!(&"SELECT * FORM Transaction"[form.offset..form.offset + 4], "FORM");
    }
}

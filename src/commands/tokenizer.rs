use crate::error::{ConsoleError, Result};

/// Splits a console line into arguments.
///
/// Whitespace separates arguments. Single or double quotes group words and
/// are stripped. A bracketed JSON value (`[...]` or `{...}`) is one argument
/// and is kept verbatim, quotes included.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    if depth > 0 {
                        current.push(c);
                    }
                    current.push(escaped);
                }
            } else if c == q {
                quote = None;
                if depth > 0 {
                    current.push(c);
                }
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                in_token = true;
                if depth > 0 {
                    current.push(c);
                }
            }
            '[' | '{' => {
                depth += 1;
                in_token = true;
                current.push(c);
            }
            ']' | '}' => {
                if depth == 0 {
                    return Err(ConsoleError::InvalidInput(format!("Unbalanced '{}'", c)));
                }
                depth -= 1;
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if quote.is_some() {
        return Err(ConsoleError::InvalidInput("Unterminated quote".to_string()));
    }
    if depth > 0 {
        return Err(ConsoleError::InvalidInput("Unbalanced brackets".to_string()));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words() {
        assert_eq!(tokenize("  get   byte fee ").unwrap(), vec!["get", "byte", "fee"]);
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_quotes() {
        assert_eq!(
            tokenize(r#"transfer gas 0x01 1 "hello world""#).unwrap(),
            vec!["transfer", "gas", "0x01", "1", "hello world"]
        );
        assert_eq!(tokenize("a '' b").unwrap(), vec!["a", "", "b"]);
        assert_eq!(tokenize(r#""say \"hi\"""#).unwrap(), vec![r#"say "hi""#]);
    }

    #[test]
    fn test_json_stays_whole() {
        let tokens =
            tokenize(r#"invoke 0xab balanceOf [{"type": "Hash160", "value": "0x01"}, 5]"#).unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3], r#"[{"type": "Hash160", "value": "0x01"}, 5]"#);
    }

    #[test]
    fn test_unbalanced() {
        assert!(matches!(tokenize("a [1, 2"), Err(ConsoleError::InvalidInput(_))));
        assert!(matches!(tokenize("a ]"), Err(ConsoleError::InvalidInput(_))));
        assert!(matches!(tokenize("a \"open"), Err(ConsoleError::InvalidInput(_))));
    }
}

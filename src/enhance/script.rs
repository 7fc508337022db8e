//! Default script compiler: comment and blank-line stripping

use async_trait::async_trait;

use super::{PluginError, ScriptCompiler};

/// Strips `//` and `/* */` comments outside string literals, then drops
/// blank lines and trailing whitespace
///
/// Unterminated strings and block comments are reported as errors rather
/// than passed through, so a broken script is never injected.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommentStrippingCompiler;

impl CommentStrippingCompiler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptCompiler for CommentStrippingCompiler {
    async fn compile(&self, source: &str) -> Result<String, PluginError> {
        let stripped = strip_comments(source)?;
        Ok(stripped
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

enum State {
    Normal,
    AfterSlash,
    InString(char),
    InStringEscape(char),
    InBlockComment,
    InBlockCommentEnd,
    InLineComment,
}

fn strip_comments(input: &str) -> Result<String, PluginError> {
    let mut output = String::with_capacity(input.len());
    let mut state = State::Normal;

    for ch in input.chars() {
        state = match state {
            State::Normal => {
                output.push(ch);
                match ch {
                    '"' | '\'' | '`' => State::InString(ch),
                    '/' => State::AfterSlash,
                    _ => State::Normal,
                }
            }
            State::AfterSlash => match ch {
                '*' => {
                    output.pop();
                    State::InBlockComment
                }
                '/' => {
                    output.pop();
                    State::InLineComment
                }
                '"' | '\'' | '`' => {
                    output.push(ch);
                    State::InString(ch)
                }
                _ => {
                    output.push(ch);
                    State::Normal
                }
            },
            State::InString(quote) => {
                output.push(ch);
                if ch == '\\' {
                    State::InStringEscape(quote)
                } else if ch == quote {
                    State::Normal
                } else if ch == '\n' && quote != '`' {
                    return Err(PluginError::Transpile(
                        "unterminated string literal".to_string(),
                    ));
                } else {
                    State::InString(quote)
                }
            }
            State::InStringEscape(quote) => {
                output.push(ch);
                State::InString(quote)
            }
            State::InBlockComment => match ch {
                '*' => State::InBlockCommentEnd,
                _ => State::InBlockComment,
            },
            State::InBlockCommentEnd => match ch {
                '/' => State::Normal,
                '*' => State::InBlockCommentEnd,
                _ => State::InBlockComment,
            },
            State::InLineComment => {
                if ch == '\n' {
                    output.push(ch);
                    State::Normal
                } else {
                    State::InLineComment
                }
            }
        };
    }

    match state {
        State::InString(_) | State::InStringEscape(_) => Err(PluginError::Transpile(
            "unterminated string literal".to_string(),
        )),
        State::InBlockComment | State::InBlockCommentEnd => Err(PluginError::Transpile(
            "unterminated block comment".to_string(),
        )),
        _ => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn compile(source: &str) -> Result<String, PluginError> {
        CommentStrippingCompiler::new().compile(source).await
    }

    #[tokio::test]
    async fn test_strips_line_and_block_comments() {
        let source = "// setup\nconst a = 1; /* inline */\n\n/* multi\nline */\nrun(a); // go\n";
        assert_eq!(compile(source).await.unwrap(), "const a = 1;\nrun(a);");
    }

    #[tokio::test]
    async fn test_keeps_comment_markers_inside_strings() {
        let source = r#"const url = "http://example.com"; const s = '/* no */';"#;
        assert_eq!(compile(source).await.unwrap(), source);
    }

    #[tokio::test]
    async fn test_keeps_division() {
        assert_eq!(compile("const half = total / 2;").await.unwrap(), "const half = total / 2;");
    }

    #[tokio::test]
    async fn test_comment_only_source_is_empty() {
        assert_eq!(compile("// nothing here\n/* or here */\n").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_unterminated_input_fails() {
        assert!(matches!(
            compile("/* never closed").await,
            Err(PluginError::Transpile(_))
        ));
        assert!(matches!(
            compile("const s = \"open;\nnext();").await,
            Err(PluginError::Transpile(_))
        ));
    }
}

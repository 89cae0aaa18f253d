//! Line classification
//!
//! Every source line is tested against [`REGISTRY`] in order and takes the
//! form of the first matcher that accepts it. Lines no matcher accepts are
//! plain text.

use super::source::SourceLine;

/// What a single line of template source means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineForm {
    /// `%tag.class#id{attrs} content`
    Tag {
        tag: String,
        classes: Vec<String>,
        ids: Vec<String>,
        rest: String,
    },
    /// `:each [key,] value in collection`
    Loop {
        key: Option<String>,
        value: String,
        collection: String,
    },
    /// `:if condition`
    If { condition: String },
    /// `:else` or `:else if condition`
    Else { condition: Option<String> },
    /// `-# ...`
    SilentComment,
    /// `/ text`
    VisibleComment { text: String },
    /// `!!! keyword`
    Doctype { keyword: String },
    Markdown,
    Script,
    Css,
    /// `- code`
    Raw { code: String },
    PlainText { text: String },
}

impl LineForm {
    /// Whether lines indented below this one belong to it
    pub fn opens_block(&self) -> bool {
        !matches!(self, LineForm::PlainText { .. })
    }
}

/// A classified line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub form: LineForm,
    pub indent: String,
}

type Matcher = fn(&SourceLine) -> Option<LineForm>;

/// Line forms in priority order
pub const REGISTRY: &[(&str, Matcher)] = &[
    ("tag", match_tag),
    ("loop", match_loop),
    ("if", match_if),
    ("else", match_else),
    ("silent comment", match_silent_comment),
    ("visible comment", match_visible_comment),
    ("doctype", match_doctype),
    ("markdown", match_markdown),
    ("script", match_script),
    ("css", match_css),
    ("raw", match_raw),
];

/// Classify a line, falling back to plain text
pub fn classify(line: &SourceLine) -> LineMatch {
    let indent = line.indent().to_string();
    for (name, matcher) in REGISTRY {
        if let Some(form) = matcher(line) {
            log::trace!("line {}: {}", line.number, name);
            return LineMatch { form, indent };
        }
    }
    log::trace!("line {}: plain text", line.number);
    LineMatch {
        form: LineForm::PlainText {
            text: line.content().to_string(),
        },
        indent,
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ':'
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Keyword followed by whitespace or the end of the line
fn keyword<'a>(content: &'a str, word: &str) -> Option<&'a str> {
    let rest = content.strip_prefix(word)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn match_tag(line: &SourceLine) -> Option<LineForm> {
    let content = line.content();
    let mut tag = None;
    let mut classes = Vec::new();
    let mut ids = Vec::new();
    let mut pos = 0;

    loop {
        let mut chars = content[pos..].chars();
        let sigil = match chars.next() {
            Some(c @ ('%' | '.' | '#')) => c,
            _ => break,
        };
        if !chars.next().is_some_and(is_name_start) {
            break;
        }
        let name_len = content[pos + 1..]
            .find(|c: char| !is_name_char(c))
            .unwrap_or(content.len() - pos - 1);
        let name = content[pos + 1..pos + 1 + name_len].to_string();
        match sigil {
            '%' => {
                tag.get_or_insert(name);
            }
            '.' => classes.push(name),
            _ => ids.push(name),
        }
        pos += 1 + name_len;
    }

    if pos == 0 {
        return None;
    }
    Some(LineForm::Tag {
        tag: tag.unwrap_or_else(|| "div".to_string()),
        classes,
        ids,
        rest: content[pos..].to_string(),
    })
}

fn match_loop(line: &SourceLine) -> Option<LineForm> {
    let content = line.content();
    let header = keyword(content, ":each").or_else(|| keyword(content, ":for"))?;
    let (vars, collection) = split_in(header)?;
    let (key, value) = match vars.split_once(',') {
        Some((key, value)) => (Some(key.trim()), value.trim()),
        None => (None, vars.trim()),
    };
    if !is_identifier(value) || key.is_some_and(|k| !is_identifier(k)) {
        return None;
    }
    Some(LineForm::Loop {
        key: key.map(str::to_string),
        value: value.to_string(),
        collection: collection.to_string(),
    })
}

/// Split `vars in collection` at the first standalone `in`
fn split_in(header: &str) -> Option<(&str, &str)> {
    let mut search = 0;
    while let Some(found) = header[search..].find("in") {
        let at = search + found;
        let before = header[..at].ends_with(char::is_whitespace);
        let after = header[at + 2..].starts_with(char::is_whitespace);
        if before && after {
            let collection = header[at + 2..].trim();
            if collection.is_empty() {
                return None;
            }
            return Some((header[..at].trim(), collection));
        }
        search = at + 2;
    }
    None
}

fn match_if(line: &SourceLine) -> Option<LineForm> {
    let condition = keyword(line.content(), ":if")?;
    if condition.is_empty() {
        return None;
    }
    Some(LineForm::If {
        condition: condition.to_string(),
    })
}

fn match_else(line: &SourceLine) -> Option<LineForm> {
    let rest = keyword(line.content(), ":else")?;
    if rest.is_empty() {
        return Some(LineForm::Else { condition: None });
    }
    let condition = keyword(rest, "if").filter(|c| !c.is_empty())?;
    Some(LineForm::Else {
        condition: Some(condition.to_string()),
    })
}

fn match_silent_comment(line: &SourceLine) -> Option<LineForm> {
    line.content()
        .starts_with("-#")
        .then_some(LineForm::SilentComment)
}

fn match_visible_comment(line: &SourceLine) -> Option<LineForm> {
    let text = line.content().strip_prefix('/')?;
    Some(LineForm::VisibleComment {
        text: text.trim().to_string(),
    })
}

fn match_doctype(line: &SourceLine) -> Option<LineForm> {
    let keyword = line.text.strip_prefix("!!!")?;
    Some(LineForm::Doctype {
        keyword: keyword.trim().to_string(),
    })
}

fn match_markdown(line: &SourceLine) -> Option<LineForm> {
    (line.content().trim_end() == ":markdown").then_some(LineForm::Markdown)
}

fn match_script(line: &SourceLine) -> Option<LineForm> {
    matches!(line.content().trim_end(), ":script" | ":javascript").then_some(LineForm::Script)
}

fn match_css(line: &SourceLine) -> Option<LineForm> {
    (line.content().trim_end() == ":css").then_some(LineForm::Css)
}

fn match_raw(line: &SourceLine) -> Option<LineForm> {
    let code = line.content().strip_prefix('-')?;
    Some(LineForm::Raw {
        code: code.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(text: &str) -> LineForm {
        classify(&SourceLine::new(1, 0, text)).form
    }

    #[test]
    fn test_tag_cluster() {
        assert_eq!(
            form("  %div.greeting#main.big{class: 'x'} Hello"),
            LineForm::Tag {
                tag: "div".to_string(),
                classes: vec!["greeting".to_string(), "big".to_string()],
                ids: vec!["main".to_string()],
                rest: "{class: 'x'} Hello".to_string(),
            }
        );
    }

    #[test]
    fn test_tag_defaults_to_div() {
        assert_eq!(
            form(".note"),
            LineForm::Tag {
                tag: "div".to_string(),
                classes: vec!["note".to_string()],
                ids: vec![],
                rest: String::new(),
            }
        );
    }

    #[test]
    fn test_namespaced_tag() {
        assert!(matches!(form("%svg:rect"), LineForm::Tag { tag, .. } if tag == "svg:rect"));
    }

    #[test]
    fn test_interpolation_is_not_a_tag() {
        assert!(matches!(form("#{name} says hi"), LineForm::PlainText { .. }));
        assert!(matches!(form(".5 apples"), LineForm::PlainText { .. }));
    }

    #[test]
    fn test_loop() {
        assert_eq!(
            form(":each i, item in list.items"),
            LineForm::Loop {
                key: Some("i".to_string()),
                value: "item".to_string(),
                collection: "list.items".to_string(),
            }
        );
        assert_eq!(
            form(":for x in range(3)"),
            LineForm::Loop {
                key: None,
                value: "x".to_string(),
                collection: "range(3)".to_string(),
            }
        );
        assert!(matches!(form(":each in"), LineForm::PlainText { .. }));
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(
            form(":if user.admin"),
            LineForm::If {
                condition: "user.admin".to_string()
            }
        );
        assert_eq!(form(":else"), LineForm::Else { condition: None });
        assert_eq!(
            form(":else if x > 1"),
            LineForm::Else {
                condition: Some("x > 1".to_string())
            }
        );
    }

    #[test]
    fn test_silent_comment_precedes_raw() {
        assert_eq!(form("-# note"), LineForm::SilentComment);
        assert_eq!(
            form("- let x = 1"),
            LineForm::Raw {
                code: "let x = 1".to_string()
            }
        );
    }

    #[test]
    fn test_comments_and_filters() {
        assert_eq!(
            form("/ hidden"),
            LineForm::VisibleComment {
                text: "hidden".to_string()
            }
        );
        assert_eq!(form(":markdown"), LineForm::Markdown);
        assert_eq!(form(":javascript"), LineForm::Script);
        assert_eq!(form(":css"), LineForm::Css);
    }

    #[test]
    fn test_doctype_only_at_column_zero() {
        assert_eq!(
            form("!!! Strict"),
            LineForm::Doctype {
                keyword: "Strict".to_string()
            }
        );
        assert!(matches!(form("  !!! 5"), LineForm::PlainText { .. }));
    }

    #[test]
    fn test_plain_text_fallback() {
        let line = classify(&SourceLine::new(1, 0, "  Hello"));
        assert_eq!(line.indent, "  ");
        assert_eq!(
            line.form,
            LineForm::PlainText {
                text: "Hello".to_string()
            }
        );
        assert!(!line.form.opens_block());
    }
}

//! Block extraction and tree building
//!
//! Lines are consumed in order. A line whose form opens a block collects
//! every following line indented deeper than itself; when a line at the
//! same or shallower indentation arrives, the block is resolved into nodes
//! and its children are compiled recursively as a standalone template.

use crate::config::TemplateConfig;
use crate::error::CompileError;
use crate::parser::{parse_statement, Expr, ExprError, Statement};

use super::attributes::{attribute_nodes, parse_attributes};
use super::doctype;
use super::interpolation::{interpolate, parse_in_line, relocate};
use super::matcher::{classify, LineForm, LineMatch};
use super::source::{check_outdent, dedent, is_child, SourceLine};
use super::tree::{ExpressionTree, Node};

/// An opening line with the lines indented beneath it
struct Block {
    line: SourceLine,
    matched: LineMatch,
    children: Vec<SourceLine>,
}

impl Block {
    /// Children with the block's indentation removed
    fn body_lines(&self) -> Result<Vec<SourceLine>, CompileError> {
        dedent(&self.children, &self.matched.indent)
    }

    /// Children as raw text, one line each
    fn body_text(&self) -> Result<String, CompileError> {
        let lines = self.body_lines()?;
        Ok(lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Compile a sequence of source lines into an expression tree
pub fn compile(lines: &[SourceLine], config: &TemplateConfig) -> Result<ExpressionTree, CompileError> {
    let mut nodes = Vec::new();
    let mut block: Option<Block> = None;

    for line in lines {
        if let Some(mut open) = block.take() {
            if is_child(line, &open.matched.indent) {
                open.children.push(line.clone());
                block = Some(open);
                continue;
            }
            check_outdent(line, &open.matched.indent)?;
            resolve(open, &mut nodes, config)?;
        }

        if line.is_blank() {
            continue;
        }

        let matched = classify(line);
        if let LineForm::PlainText { text } = &matched.form {
            nodes.extend(plain_text(text, line, config)?);
            continue;
        }
        block = Some(Block {
            line: line.clone(),
            matched,
            children: Vec::new(),
        });
    }

    if let Some(open) = block {
        resolve(open, &mut nodes, config)?;
    }

    if nodes.is_empty() {
        return Ok(ExpressionTree::empty_literal());
    }
    Ok(ExpressionTree::new(nodes))
}

/// Turn a finished block into nodes appended to `nodes`
fn resolve(block: Block, nodes: &mut Vec<Node>, config: &TemplateConfig) -> Result<(), CompileError> {
    let line = &block.line;
    log::debug!(
        "line {}: resolving {:?} with {} child line(s)",
        line.number,
        block.matched.form,
        block.children.len()
    );

    match &block.matched.form {
        LineForm::Tag {
            tag,
            classes,
            ids,
            rest,
        } => nodes.extend(compile_tag(&block, tag, classes, ids, rest, config)?),
        LineForm::Loop {
            key,
            value,
            collection,
        } => nodes.push(Node::Loop {
            key: key.clone(),
            value: value.clone(),
            collection: parse_in_line(collection, line)?,
            body: compile(&block.body_lines()?, config)?,
        }),
        LineForm::If { condition } => nodes.push(Node::Conditional {
            branches: vec![(
                parse_in_line(condition, line)?,
                compile(&block.body_lines()?, config)?,
            )],
            otherwise: None,
        }),
        LineForm::Else { condition } => {
            let condition = match condition {
                Some(source) => Some(parse_in_line(source, line)?),
                None => None,
            };
            let body = compile(&block.body_lines()?, config)?;
            attach_else(nodes, condition, body, line)?;
        }
        LineForm::SilentComment => {}
        LineForm::VisibleComment { text } => {
            let mut parts = vec![text.clone()];
            if !block.children.is_empty() {
                parts.push(block.body_text()?);
            }
            nodes.push(Node::Literal(format!("<!--{}-->", parts.join("\n"))));
        }
        LineForm::Doctype { keyword } => {
            let declaration = match doctype::declaration(keyword) {
                Some(declaration) => declaration,
                None if config.strict_doctype => {
                    return Err(CompileError::UnknownDoctype {
                        line: line.number,
                        span: line.span(),
                        keyword: keyword.clone(),
                    })
                }
                None => {
                    log::warn!("line {}: unknown doctype '{}', emitting nothing", line.number, keyword);
                    ""
                }
            };
            nodes.push(Node::Literal(format!("{}\n", declaration)));
        }
        LineForm::Markdown => {
            let html = markdown::to_html(&block.body_text()?);
            nodes.extend(interpolate(&html, line)?);
        }
        LineForm::Script => {
            let script = format!(
                "\n<script type=\"text/javascript\">\n//<![CDATA[\n{}\n//]]>\n</script>\n",
                block.body_text()?
            );
            nodes.extend(interpolate(&script, line)?);
        }
        LineForm::Css => {
            nodes.push(Node::Literal(format!(
                "<style type=\"text/css\">\n{}\n</style>",
                block.body_text()?
            )));
        }
        LineForm::Raw { code } => compile_raw(&block, code, nodes, config)?,
        LineForm::PlainText { text } => nodes.extend(plain_text(text, line, config)?),
    }
    Ok(())
}

/// Extend the conditional just before this line with another branch
fn attach_else(
    nodes: &mut [Node],
    condition: Option<Expr>,
    body: ExpressionTree,
    line: &SourceLine,
) -> Result<(), CompileError> {
    match nodes.last_mut() {
        Some(Node::Conditional {
            branches,
            otherwise,
        }) if otherwise.is_none() => {
            match condition {
                Some(condition) => branches.push((condition, body)),
                None => *otherwise = Some(body),
            }
            Ok(())
        }
        _ => Err(CompileError::DanglingElse {
            line: line.number,
            span: line.span(),
        }),
    }
}

fn compile_tag(
    block: &Block,
    tag: &str,
    classes: &[String],
    ids: &[String],
    rest: &str,
    config: &TemplateConfig,
) -> Result<Vec<Node>, CompileError> {
    let line = &block.line;
    let parsed = parse_attributes(rest).map_err(|_| CompileError::MalformedAttributeBlock {
        line: line.number,
        span: line.span(),
    })?;

    // Specifiers must directly follow the tag or its attribute block
    let (inside, around, content) = if rest.starts_with(' ') {
        (false, false, parsed.content.as_str())
    } else {
        whitespace_specifiers(&parsed.content)
    };
    let content = content.trim();

    let mut body_lines = Vec::new();
    if !content.is_empty() {
        body_lines.push(SourceLine::new(line.number, line.locate(content).start, content));
    }
    body_lines.extend(block.body_lines()?);
    let body = compile(&body_lines, config)?;
    let has_content = !body.is_blank();

    let mut nodes = vec![Node::Literal(format!("<{}", tag))];
    nodes.extend(attribute_nodes(&parsed.attrs, classes, ids, line)?);

    if config.self_closing.self_closes(tag, has_content) {
        nodes.push(Node::literal(" />"));
    } else {
        nodes.push(Node::literal(">"));
        if inside {
            nodes.push(Node::literal(if has_content { " " } else { "  " }));
        }
        if has_content {
            nodes.extend(body.nodes);
            if inside {
                nodes.push(Node::literal(" "));
            }
        }
        nodes.push(Node::Literal(format!("</{}>", tag)));
    }

    if around {
        nodes.insert(0, Node::literal(" "));
        nodes.push(Node::literal(" "));
    }
    Ok(nodes)
}

/// Leading `<` (pad inside) and `>` (pad around), at most one of each
fn whitespace_specifiers(content: &str) -> (bool, bool, &str) {
    let mut inside = false;
    let mut around = false;
    let mut rest = content;
    for _ in 0..2 {
        if !inside && rest.starts_with('<') {
            inside = true;
            rest = &rest[1..];
        } else if !around && rest.starts_with('>') {
            around = true;
            rest = &rest[1..];
        }
    }
    (inside, around, rest)
}

fn compile_raw(
    block: &Block,
    code: &str,
    nodes: &mut Vec<Node>,
    config: &TemplateConfig,
) -> Result<(), CompileError> {
    let line = &block.line;
    match parse_statement_in_line(code, line)? {
        Statement::For {
            key,
            value,
            collection,
        } => nodes.push(Node::Loop {
            key,
            value,
            collection,
            body: compile(&block.body_lines()?, config)?,
        }),
        Statement::If(condition) => nodes.push(Node::Conditional {
            branches: vec![(condition, compile(&block.body_lines()?, config)?)],
            otherwise: None,
        }),
        Statement::ElseIf(condition) => {
            let body = compile(&block.body_lines()?, config)?;
            attach_else(nodes, Some(condition), body, line)?;
        }
        Statement::Else => {
            let body = compile(&block.body_lines()?, config)?;
            attach_else(nodes, None, body, line)?;
        }
        statement => {
            nodes.extend(statement_node(statement));
            // Lines indented under plain code continue it, one statement each
            for child in block.body_lines()? {
                if child.is_blank() {
                    continue;
                }
                let statement = parse_statement_in_line(child.content(), &child)?;
                if statement.opens_body() {
                    return Err(CompileError::Expression {
                        line: child.number,
                        span: child.span(),
                        error: ExprError {
                            message: "block statements need a '-' line of their own".to_string(),
                            span: 0..child.content().len(),
                            expected: Vec::new(),
                        },
                    });
                }
                nodes.extend(statement_node(statement));
            }
        }
    }
    Ok(())
}

/// Node for a statement without a body
fn statement_node(statement: Statement) -> Option<Node> {
    match statement {
        Statement::Assign {
            name,
            value,
            declare,
        } => Some(Node::Assign {
            name,
            value,
            declare,
        }),
        Statement::Expr(expr) => Some(Node::Effect(expr)),
        _ => None,
    }
}

fn parse_statement_in_line(code: &str, line: &SourceLine) -> Result<Statement, CompileError> {
    parse_statement(code).map_err(|error| CompileError::Expression {
        line: line.number,
        span: relocate(&error.span, code, line),
        error,
    })
}

/// Compile a line no matcher claimed
fn plain_text(text: &str, line: &SourceLine, config: &TemplateConfig) -> Result<Vec<Node>, CompileError> {
    if let Some(escaped) = text.strip_prefix('\\') {
        return interpolate(escaped, line);
    }
    if let Some(code) = text.strip_prefix("&=") {
        return escaped_output(code.trim(), line);
    }
    if let Some(code) = text.strip_prefix("!=") {
        return raw_output(code.trim(), line);
    }
    if let Some(code) = text.strip_prefix('=') {
        let code = code.trim();
        return if config.escape_html_by_default {
            escaped_output(code, line)
        } else {
            raw_output(code, line)
        };
    }
    interpolate(text, line)
}

/// `&= code`: the value is escaped, string literals included
fn escaped_output(code: &str, line: &SourceLine) -> Result<Vec<Node>, CompileError> {
    Ok(vec![Node::Expression {
        expr: parse_in_line(code, line)?,
        escape: true,
    }])
}

/// `!= code`: the value is written as is; a string literal is interpolated
fn raw_output(code: &str, line: &SourceLine) -> Result<Vec<Node>, CompileError> {
    match parse_in_line(code, line)? {
        Expr::Str(text) => interpolate(&text, line),
        expr => Ok(vec![Node::Expression {
            expr,
            escape: false,
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelfClosingPolicy;
    use crate::markup::optimize;
    use crate::markup::source::source_lines;
    use pretty_assertions::assert_eq;

    fn tree(source: &str) -> ExpressionTree {
        compile(&source_lines(source), &TemplateConfig::default()).unwrap()
    }

    fn literal_output(source: &str, config: &TemplateConfig) -> String {
        let tree = optimize(compile(&source_lines(source), config).unwrap());
        assert!(tree.is_literal(), "expected literal output, got:\n{}", tree);
        tree.nodes
            .iter()
            .map(|node| match node {
                Node::Literal(s) => s.as_str(),
                _ => "",
            })
            .collect()
    }

    fn html(source: &str) -> String {
        literal_output(source, &TemplateConfig::default())
    }

    fn compile_err(source: &str) -> CompileError {
        compile(&source_lines(source), &TemplateConfig::default()).unwrap_err()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(tree(""), ExpressionTree::empty_literal());
        assert_eq!(tree("-# nothing"), ExpressionTree::empty_literal());
    }

    #[test]
    fn test_nested_tags() {
        assert_eq!(
            html("%ul\n  %li one\n  %li two\n%p after"),
            "<ul><li>one</li><li>two</li></ul><p>after</p>"
        );
    }

    #[test]
    fn test_inline_content_precedes_children() {
        assert_eq!(html("%p Hello\n  world"), "<p>Helloworld</p>");
    }

    #[test]
    fn test_class_merge() {
        assert_eq!(
            html("%div.greeting{class: \"x\"} Hello"),
            "<div class=\"greeting x\">Hello</div>"
        );
    }

    #[test]
    fn test_void_tags() {
        assert_eq!(html("%br"), "<br />");
        assert_eq!(html("%img{src: 'a.png'}"), "<img src=\"a.png\" />");
        assert_eq!(html("%div"), "<div></div>");
    }

    #[test]
    fn test_xml_self_closing() {
        let config = TemplateConfig::default().with_self_closing(SelfClosingPolicy::Xml);
        assert_eq!(literal_output("%node", &config), "<node />");
        assert_eq!(literal_output("%br text", &config), "<br>text</br>");
    }

    #[test]
    fn test_whitespace_specifiers() {
        assert_eq!(html("%b< x"), "<b> x </b>");
        assert_eq!(html("%b<"), "<b>  </b>");
        assert_eq!(html("%b> x"), " <b>x</b> ");
        assert_eq!(html("%b<> x"), " <b> x </b> ");
        assert_eq!(html("%b>< x"), " <b> x </b> ");
    }

    #[test]
    fn test_paren_attributes() {
        assert_eq!(html("%a(href='/' title=\"t\") Home"), "<a href=\"/\" title=\"t\">Home</a>");
    }

    #[test]
    fn test_comments() {
        assert_eq!(html("/ note\n  more"), "<!--note\nmore-->");
        assert_eq!(html("-# hidden\n  %p gone\n%p kept"), "<p>kept</p>");
    }

    #[test]
    fn test_doctype() {
        assert_eq!(html("!!! 5\n%html"), "<!DOCTYPE html>\n<html></html>");
        assert_eq!(html("!!! html6"), "\n");
    }

    #[test]
    fn test_strict_doctype() {
        let config = TemplateConfig::default().with_strict_doctype(true);
        let err = compile(&source_lines("!!! html6"), &config).unwrap_err();
        assert!(matches!(err, CompileError::UnknownDoctype { line: 1, keyword, .. } if keyword == "html6"));
    }

    #[test]
    fn test_filters() {
        assert_eq!(html(":css\n  p { color: red; }"), "<style type=\"text/css\">\np { color: red; }\n</style>");
        assert_eq!(
            html(":javascript\n  go();"),
            "\n<script type=\"text/javascript\">\n//<![CDATA[\ngo();\n//]]>\n</script>\n"
        );
        assert_eq!(html(":markdown\n  # Title"), "<h1>Title</h1>");
    }

    #[test]
    fn test_plain_text_sigils() {
        assert_eq!(html("\\= not code"), "= not code");
        assert_eq!(html("!= \"<b>hi</b>\""), "<b>hi</b>");
        assert_eq!(html("%p <b>inline</b>"), "<p><b>inline</b></p>");
    }

    #[test]
    fn test_escaped_output_of_literal() {
        let tree = tree("&= \"<b>#{x}\"");
        assert_eq!(
            tree.nodes,
            vec![Node::Expression {
                expr: Expr::Str("<b>#{x}".to_string()),
                escape: true
            }]
        );
    }

    #[test]
    fn test_equals_follows_config() {
        let code = Node::Expression {
            expr: Expr::Var("x".to_string()),
            escape: false,
        };
        assert_eq!(tree("= x").nodes, vec![code]);

        let config = TemplateConfig::default().with_escape_html_by_default(true);
        let escaped = compile(&source_lines("= x"), &config).unwrap();
        assert_eq!(
            escaped.nodes,
            vec![Node::Expression {
                expr: Expr::Var("x".to_string()),
                escape: true
            }]
        );
    }

    #[test]
    fn test_loop_block() {
        let tree = tree(":each i, item in items\n  %li= item");
        let Node::Loop {
            key, value, body, ..
        } = &tree.nodes[0]
        else {
            panic!("expected loop, got {}", tree);
        };
        assert_eq!(key.as_deref(), Some("i"));
        assert_eq!(value, "item");
        assert_eq!(body.nodes.len(), 4);
    }

    #[test]
    fn test_if_else_chain() {
        let tree = tree(":if a\n  x\n:else if b\n  y\n:else\n  z");
        let Node::Conditional {
            branches,
            otherwise,
        } = &tree.nodes[0]
        else {
            panic!("expected conditional, got {}", tree);
        };
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(branches.len(), 2);
        assert!(otherwise.is_some());
    }

    #[test]
    fn test_raw_if_else() {
        let tree = tree("- if a\n  x\n- else\n  y");
        assert!(matches!(
            &tree.nodes[..],
            [Node::Conditional { branches, otherwise: Some(_) }] if branches.len() == 1
        ));
    }

    #[test]
    fn test_dangling_else() {
        assert!(matches!(compile_err("%p\n:else\n  x"), CompileError::DanglingElse { line: 2, .. }));
        assert!(matches!(
            compile_err(":if a\n  x\n:else\n  y\n:else\n  z"),
            CompileError::DanglingElse { line: 5, .. }
        ));
    }

    #[test]
    fn test_raw_statements_continue_on_child_lines() {
        let tree = tree("- let a = 1\n  a = a + 1\n= a");
        assert_eq!(
            tree.nodes[..2],
            [
                Node::Assign {
                    name: "a".to_string(),
                    value: Expr::Number(1.0),
                    declare: true
                },
                Node::Assign {
                    name: "a".to_string(),
                    value: Expr::concat(Expr::Var("a".to_string()), Expr::Number(1.0)),
                    declare: false
                },
            ]
        );
    }

    #[test]
    fn test_block_statement_in_continuation() {
        assert!(matches!(
            compile_err("- let a = 1\n  for x in a"),
            CompileError::Expression { line: 2, .. }
        ));
    }

    #[test]
    fn test_malformed_attributes() {
        let err = compile_err("%p\n%a{href: '/'");
        assert!(matches!(err, CompileError::MalformedAttributeBlock { line: 2, .. }));
        assert_eq!(err.span(), Some(3..15));
    }

    #[test]
    fn test_mixed_indentation() {
        assert!(matches!(
            compile_err("  %ul\n    %li a\n\t%li b"),
            CompileError::MixedIndentation { line: 3, .. }
        ));
    }

    #[test]
    fn test_expression_error_location() {
        let err = compile_err("%p\n%p= 1 +");
        assert!(matches!(err, CompileError::Expression { line: 2, .. }));
    }

    #[test]
    fn test_blank_lines_inside_blocks() {
        assert_eq!(html("%div\n\n  %p a\n\n  %p b"), "<div><p>a</p><p>b</p></div>");
    }
}

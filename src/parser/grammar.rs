//! Parser implementation using chumsky

use chumsky::error::{RichPattern, RichReason};
use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::ast::*;
use super::lexer::{lex, Token};
use super::ExprError;

/// Suffix applied to an atom: `.name` or `[index]`
#[derive(Debug, Clone)]
enum Postfix {
    Member(String),
    Index(Expr),
}

/// Parse a complete embedded expression
pub fn parse_expr(input: &str) -> Result<Expr, ExprError> {
    let len = input.len();
    let tokens = lex(input)?;
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    expr_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(first_error)
}

/// Parse the code of a raw (`-`) line into a statement
pub fn parse_statement(input: &str) -> Result<Statement, ExprError> {
    let len = input.len();
    let tokens = lex(input)?;
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    statement_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(first_error)
}

/// Templates report one diagnostic per line, so only the first error is kept
fn first_error(errs: Vec<Rich<'_, Token>>) -> ExprError {
    errs.into_iter()
        .next()
        .map(ExprError::from)
        .unwrap_or_else(|| ExprError {
            message: "invalid expression".to_string(),
            span: 0..0,
            expected: Vec::new(),
        })
}

fn expr_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let ident = select! {
            Token::Ident(s) => s,
        };

        let literal = select! {
            Token::Number(n) => Expr::Number(n),
            Token::String(s) => Expr::Str(s),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Null => Expr::Null,
        };

        let items = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>();

        let call = ident
            .clone()
            .then(
                items
                    .clone()
                    .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
            )
            .map(|(name, args)| Expr::Call(name, args));

        let array = items
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map(Expr::Array);

        // Note: call must be tried before a bare variable, both start with an identifier
        let atom = choice((
            literal,
            call,
            ident.clone().map(Expr::Var),
            array,
            expr.clone()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        ))
        .boxed();

        let postfix = choice((
            just(Token::Dot).ignore_then(ident).map(Postfix::Member),
            expr.clone()
                .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
                .map(Postfix::Index),
        ));

        let access = atom
            .foldl(postfix.repeated(), |lhs, suffix| match suffix {
                Postfix::Member(name) => Expr::Member(Box::new(lhs), name),
                Postfix::Index(index) => Expr::Index(Box::new(lhs), Box::new(index)),
            })
            .boxed();

        let unary = choice((
            just(Token::Minus).to(UnaryOp::Neg),
            just(Token::Bang).to(UnaryOp::Not),
        ))
        .repeated()
        .foldr(access, |op, rhs| Expr::Unary(op, Box::new(rhs)))
        .boxed();

        let product_op = choice((
            just(Token::Star).to(BinOp::Mul),
            just(Token::Slash).to(BinOp::Div),
            just(Token::Percent).to(BinOp::Rem),
        ));
        let product = unary
            .clone()
            .foldl(product_op.then(unary).repeated(), binary)
            .boxed();

        let sum_op = choice((
            just(Token::Plus).to(BinOp::Add),
            just(Token::Minus).to(BinOp::Sub),
        ));
        let sum = product
            .clone()
            .foldl(sum_op.then(product).repeated(), binary)
            .boxed();

        let compare_op = choice((
            just(Token::LessOrEqual).to(BinOp::Le),
            just(Token::GreaterOrEqual).to(BinOp::Ge),
            just(Token::Less).to(BinOp::Lt),
            just(Token::Greater).to(BinOp::Gt),
        ));
        let comparison = sum
            .clone()
            .foldl(compare_op.then(sum).repeated(), binary)
            .boxed();

        let equality_op = choice((
            just(Token::EqEq).to(BinOp::Eq),
            just(Token::NotEq).to(BinOp::NotEq),
        ));
        let equality = comparison
            .clone()
            .foldl(equality_op.then(comparison).repeated(), binary)
            .boxed();

        let and = equality
            .clone()
            .foldl(
                just(Token::AndAnd).to(BinOp::And).then(equality).repeated(),
                binary,
            )
            .boxed();

        let or = and
            .clone()
            .foldl(just(Token::OrOr).to(BinOp::Or).then(and).repeated(), binary)
            .boxed();

        or.clone()
            .then(
                just(Token::Question)
                    .ignore_then(expr.clone())
                    .then_ignore(just(Token::Colon))
                    .then(expr)
                    .or_not(),
            )
            .map(|(condition, branches)| match branches {
                Some((then, otherwise)) => Expr::Ternary(
                    Box::new(condition),
                    Box::new(then),
                    Box::new(otherwise),
                ),
                None => condition,
            })
    })
}

fn binary(lhs: Expr, (op, rhs): (BinOp, Expr)) -> Expr {
    Expr::Binary(Box::new(lhs), op, Box::new(rhs))
}

fn statement_parser<'a, I>() -> impl Parser<'a, I, Statement, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let expr = expr_parser();

    let ident = select! {
        Token::Ident(s) => s,
    };

    // for [key,] value in collection
    let for_stmt = just(Token::For)
        .ignore_then(ident.clone())
        .then(just(Token::Comma).ignore_then(ident.clone()).or_not())
        .then_ignore(just(Token::In))
        .then(expr.clone())
        .map(|((first, second), collection)| match second {
            Some(value) => Statement::For {
                key: Some(first),
                value,
                collection,
            },
            None => Statement::For {
                key: None,
                value: first,
                collection,
            },
        });

    let if_stmt = just(Token::If)
        .ignore_then(expr.clone())
        .map(Statement::If);

    let else_stmt = just(Token::Else)
        .ignore_then(just(Token::If).ignore_then(expr.clone()).or_not())
        .map(|condition| match condition {
            Some(condition) => Statement::ElseIf(condition),
            None => Statement::Else,
        });

    let assign = just(Token::Let)
        .or_not()
        .then(ident)
        .then_ignore(just(Token::Assign))
        .then(expr.clone())
        .map(|((declare, name), value)| Statement::Assign {
            name,
            value,
            declare: declare.is_some(),
        });

    // Note: Order matters! assignment before a bare expression, both may start
    // with an identifier
    choice((
        for_stmt,
        if_stmt,
        else_stmt,
        assign,
        expr.map(Statement::Expr),
    ))
}

impl<'a> From<Rich<'a, Token>> for ExprError {
    fn from(err: Rich<'a, Token>) -> Self {
        let message = match err.reason() {
            RichReason::Custom(msg) => msg.to_string(),
            _ => match err.found() {
                Some(tok) => format!("unexpected {}", format_token(tok)),
                None => "unexpected end of expression".to_string(),
            },
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                RichPattern::Token(tok) => Some(format_token(tok)),
                RichPattern::Label(label) => Some(label.to_string()),
                RichPattern::EndOfInput => Some("end of input".to_string()),
                _ => None,
            })
            .collect();

        ExprError {
            message,
            span: err.span().into_range(),
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::String(s) => format!("string \"{}\"", s),
        Token::Number(n) => format!("number {}", n),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Question => "'?'".to_string(),
        Token::Assign => "'='".to_string(),
        Token::For => "keyword 'for'".to_string(),
        Token::In => "keyword 'in'".to_string(),
        Token::If => "keyword 'if'".to_string(),
        Token::Else => "keyword 'else'".to_string(),
        Token::Let => "keyword 'let'".to_string(),
        _ => format!("{:?}", tok),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    #[test]
    fn test_parse_variable() {
        assert_eq!(parse_expr("name").unwrap(), var("name"));
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse_expr("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                Box::new(Expr::Number(1.0)),
                BinOp::Add,
                Box::new(Expr::Binary(
                    Box::new(Expr::Number(2.0)),
                    BinOp::Mul,
                    Box::new(Expr::Number(3.0))
                ))
            )
        );
    }

    #[test]
    fn test_parse_member_index_and_call() {
        let expr = parse_expr("upcase(user.names[0])").unwrap();
        assert_eq!(
            expr,
            Expr::Call(
                "upcase".to_string(),
                vec![Expr::Index(
                    Box::new(Expr::Member(Box::new(var("user")), "names".to_string())),
                    Box::new(Expr::Number(0.0))
                )]
            )
        );
    }

    #[test]
    fn test_parse_ternary_and_logic() {
        let expr = parse_expr("a && !b ? 'yes' : 'no'").unwrap();
        match expr {
            Expr::Ternary(condition, then, otherwise) => {
                assert!(matches!(*condition, Expr::Binary(_, BinOp::And, _)));
                assert_eq!(*then, Expr::Str("yes".to_string()));
                assert_eq!(*otherwise, Expr::Str("no".to_string()));
            }
            other => panic!("Expected ternary, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_array_literal() {
        assert_eq!(
            parse_expr("[1, 'a',]").unwrap(),
            Expr::Array(vec![Expr::Number(1.0), Expr::Str("a".to_string())])
        );
    }

    #[test]
    fn test_parse_negation() {
        assert_eq!(
            parse_expr("-x").unwrap(),
            Expr::Unary(UnaryOp::Neg, Box::new(var("x")))
        );
    }

    #[test]
    fn test_parse_error_trailing_tokens() {
        let err = parse_expr("a b").unwrap_err();
        assert!(err.message.contains("identifier 'b'"), "{}", err.message);
        assert_eq!(err.span, 2..3);
    }

    #[test]
    fn test_parse_error_end_of_input() {
        let err = parse_expr("a +").unwrap_err();
        assert_eq!(err.message, "unexpected end of expression");
    }

    #[test]
    fn test_parse_for_statement() {
        assert_eq!(
            parse_statement("for item in items").unwrap(),
            Statement::For {
                key: None,
                value: "item".to_string(),
                collection: var("items"),
            }
        );
        assert_eq!(
            parse_statement("for i, item in items").unwrap(),
            Statement::For {
                key: Some("i".to_string()),
                value: "item".to_string(),
                collection: var("items"),
            }
        );
    }

    #[test]
    fn test_parse_conditional_statements() {
        assert_eq!(parse_statement("if ok").unwrap(), Statement::If(var("ok")));
        assert_eq!(
            parse_statement("else if ok").unwrap(),
            Statement::ElseIf(var("ok"))
        );
        assert_eq!(parse_statement("else").unwrap(), Statement::Else);
    }

    #[test]
    fn test_parse_assignment_statements() {
        assert_eq!(
            parse_statement("let total = 1").unwrap(),
            Statement::Assign {
                name: "total".to_string(),
                value: Expr::Number(1.0),
                declare: true,
            }
        );
        assert_eq!(
            parse_statement("total = total + 1").unwrap(),
            Statement::Assign {
                name: "total".to_string(),
                value: Expr::concat(var("total"), Expr::Number(1.0)),
                declare: false,
            }
        );
    }

    #[test]
    fn test_parse_expression_statement() {
        assert_eq!(
            parse_statement("missing").unwrap(),
            Statement::Expr(var("missing"))
        );
        assert!(matches!(
            parse_statement("a == b").unwrap(),
            Statement::Expr(Expr::Binary(_, BinOp::Eq, _))
        ));
    }
}

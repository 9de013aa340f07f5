//! Finds the top-level declarations in a source file.
//!
//! This is not a full parser. The [`lexer`] splits the file into [`Token`]s,
//! and [`items`] tracks bracket nesting and recognises only the clauses that
//! declare names at the top level: `package`, `var`, `const`, `type` and
//! `func`, including their parenthesised group forms. Method declarations are
//! ignored.

use chumsky::prelude::*;

use super::super::model::{Name};

/// The lexical items that the scanner cares about.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'src> {
    Ident(&'src str),
    Open,
    Close,
    Comma,

    /// A semicolon or a line break.
    End,

    /// Any other item, e.g. a literal or an operator.
    Other,
}

/// Splits source text into [`Token`]s, discarding comments.
///
/// A block comment that spans lines counts as a line break.
fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<Token<'src>>> {
    let comment = choice((
        just("//").then(none_of('\n').repeated()).to(None),
        just("/*")
            .ignore_then(any().and_is(just("*/").not()).repeated().to_slice())
            .then_ignore(just("*/").ignored().or(end()))
            .map(|body: &str| body.contains('\n').then_some(Token::End)),
    ));

    let escape = just('\\').then(any()).ignored();
    let quoted = |quote: char| {
        just(quote)
            .then(choice((escape.clone(), none_of([quote, '\\', '\n']).ignored())).repeated())
            .then(just(quote))
            .ignored()
    };
    let literal = choice((
        quoted('"'),
        quoted('\''),
        just('`').then(none_of('`').repeated()).then(just('`')).ignored(),
    ))
    .to(Token::Other);

    let word = any()
        .filter(|c: &char| c.is_alphabetic() || *c == '_')
        .then(any().filter(|c: &char| c.is_alphanumeric() || *c == '_').repeated())
        .to_slice()
        .map(Token::Ident);

    let number = any()
        .filter(char::is_ascii_digit)
        .then(any().filter(|c: &char| c.is_ascii_alphanumeric() || *c == '.' || *c == '_').repeated())
        .to(Token::Other);

    let token = choice((
        literal,
        one_of("([{").to(Token::Open),
        one_of(")]}").to(Token::Close),
        just(',').to(Token::Comma),
        one_of(";\r\n").to(Token::End),
        word,
        number,
        any().to(Token::Other),
    ))
    .map(Some);

    choice((comment, token))
        .padded_by(text::inline_whitespace())
        .repeated()
        .collect::<Vec<_>>()
        .map(|tokens: Vec<Option<Token<'src>>>| tokens.into_iter().flatten().collect())
}

// ----------------------------------------------------------------------------

/// The names declared at the top level of one source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    /// The name in the `package` clause, if there is one.
    pub module: Option<String>,

    pub variables: Vec<Name>,
    pub constants: Vec<Name>,
    pub functions: Vec<Name>,
    pub types: Vec<Name>,
}

/// One top-level clause.
#[derive(Debug, Clone, PartialEq)]
enum Item<'src> {
    Module(&'src str),
    Variables(Vec<&'src str>),
    Constants(Vec<&'src str>),
    Types(Vec<&'src str>),

    /// `None` for a method, which belongs to its receiver's type.
    Function(Option<&'src str>),

    /// Anything that declares nothing.
    Other,
}

/// A `keyword` clause, or a parenthesised group of them.
fn declaration<'src, P>(
    keyword: &'static str,
    clause: P,
) -> impl Parser<'src, &'src [Token<'src>], Vec<&'src str>> + Clone
where
    P: Parser<'src, &'src [Token<'src>], Vec<&'src str>> + Clone,
{
    let group = choice((clause.clone(), just(Token::End).to(Vec::new())))
        .repeated()
        .collect::<Vec<_>>()
        .map(|clauses: Vec<Vec<&'src str>>| clauses.concat())
        .delimited_by(just(Token::Open), just(Token::Close));
    just(Token::Ident(keyword)).ignore_then(choice((group, clause)))
}

/// Splits a token stream into top-level [`Item`]s.
fn items<'src>() -> impl Parser<'src, &'src [Token<'src>], Vec<Item<'src>>> {
    let ident = select! { Token::Ident(name) => name };

    let balanced = recursive(|balanced| {
        just(Token::Open)
            .then(choice((
                balanced,
                any().filter(|t: &Token| !matches!(t, Token::Open | Token::Close)).ignored(),
            )).repeated())
            .then(just(Token::Close))
            .ignored()
    });

    // Up to a line end, or a closer belonging to an enclosing group.
    let rest = choice((
        balanced.clone(),
        any().filter(|t: &Token| !matches!(t, Token::Open | Token::Close | Token::End)).ignored(),
    ))
    .repeated();

    let names = ident
        .separated_by(just(Token::Comma))
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(rest.clone());
    let type_name = ident.map(|name| vec![name]).then_ignore(rest.clone());

    let package = just(Token::Ident("package"))
        .ignore_then(ident)
        .then_ignore(rest.clone())
        .map(Item::Module);
    let function = just(Token::Ident("func"))
        .ignore_then(ident.or_not())
        .then_ignore(rest)
        .map(Item::Function);

    // Unbalanced brackets are swallowed one at a time.
    let other = choice((
        balanced,
        any().filter(|t: &Token| *t != Token::End).ignored(),
    ))
    .repeated()
    .at_least(1)
    .to(Item::Other);

    choice((
        package,
        declaration("var", names.clone()).map(Item::Variables),
        declaration("const", names).map(Item::Constants),
        declaration("type", type_name).map(Item::Types),
        function,
        just(Token::End).to(Item::Other),
        other,
    ))
    .repeated()
    .collect()
}

/// Lists every name declared at the top level of `source`, exported or not.
pub fn scan(source: &str) -> Declarations {
    let tokens = lexer().parse(source).into_output().unwrap_or_default();
    let items = items().parse(&tokens[..]).into_output().unwrap_or_default();
    let mut ret = Declarations::default();
    for item in items {
        let (list, names) = match item {
            Item::Module(name) => {
                ret.module.get_or_insert_with(|| name.to_owned());
                continue;
            },
            Item::Variables(names) => (&mut ret.variables, names),
            Item::Constants(names) => (&mut ret.constants, names),
            Item::Types(names) => (&mut ret.types, names),
            Item::Function(Some(name)) => (&mut ret.functions, vec![name]),
            Item::Function(None) | Item::Other => continue,
        };
        list.extend(names.into_iter().map(Name::from));
    }
    ret
}

// ----------------------------------------------------------------------------

// Standard Library Imports
use std::{fmt::Display, iter};

// External Crate Imports
use miette::{Diagnostic, LabeledSpan, SourceSpan};
use nom::{
    Err, Finish, IResult, Parser,
    branch::alt,
    bytes::complete::{take_till1, take_while, take_while1},
    character::complete::char,
    combinator::{all_consuming, consumed, cut, eof, map, opt, peek},
    error::ErrorKind,
    multi::many_till,
    sequence::{pair, preceded, terminated},
};
use thiserror::Error;

// Public API ==========================================================================================================

/// A single whitespace-delimited entry in a sequence: a building block, optionally followed by a bracketed modifier
/// that is incorporated right after it
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Token<'s> {
    pub text: &'s str,
    pub base: &'s str,
    pub modifier: Option<&'s str>,
}

impl<'s> Token<'s> {
    /// The names of the blocks this token incorporates, in the order they are added
    pub fn blocks(&self) -> impl Iterator<Item = &'s str> {
        iter::once(self.base).chain(self.modifier)
    }
}

/// Splits a sequence into [`Token`]s, returned in processing order: the rightmost token in the text comes first
///
/// # Errors
///
/// Fails on an empty (or all-whitespace) sequence, or on any token with malformed modifier brackets
pub fn tokenize(sequence: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut parser = all_consuming(tokens);
    let (_, mut tokens) = parser(sequence)
        .finish()
        .map_err(|e| e.finalize(sequence))?;
    tokens.reverse();
    Ok(tokens)
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("{kind}")]
pub struct ParseError {
    sequence: String,
    span: SourceSpan,
    kind: ParseErrorKind,
}

impl ParseError {
    pub const fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    pub const fn span(&self) -> SourceSpan {
        self.span
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum ParseErrorKind {
    #[diagnostic(help("provide at least one building block, like: Ac A E C K(FAM) A E C CONH2"))]
    #[error("the sequence is empty")]
    EmptySequence,

    #[diagnostic(help("tokens must start with a building-block name, like K or K(FAM)"))]
    #[error("expected a building-block name")]
    ExpectedBlockName,

    #[diagnostic(help("brackets must contain exactly one modifier name, like K(FAM)"))]
    #[error("expected a modifier name")]
    ExpectedModifier,

    #[diagnostic(help("you've probably forgotten to close an earlier '(' bracket"))]
    #[error("expected ')' to close modifier brackets")]
    ExpectedClosingBracket,

    #[diagnostic(help("separate building blocks with whitespace, like K(FAM) A"))]
    #[error("expected whitespace after a building block")]
    ExpectedWhitespace,

    #[diagnostic(help(
        "this is an internal error that you shouldn't ever see! If you have gotten this error, then please report it \
        as a bug!"
    ))]
    #[error("internal `nom` error: {0:?}")]
    NomError(ErrorKind),
}

// Sequence Grammar ====================================================================================================

/// Sequence = { ws } , Token , { { ws }- , Token } , { ws } ;
fn tokens(i: &str) -> ParseResult<Vec<Token>> {
    let parser = many_till(terminated(cut(token), whitespace0), eof);
    let (rest, (tokens, _)) = preceded(whitespace0, parser)(i)?;
    if tokens.is_empty() {
        return Err(Err::Failure(TokenError::new(i, ParseErrorKind::EmptySequence)));
    }
    Ok((rest, tokens))
}

/// Token = Name , [ "(" , Name , ")" ] ;
fn token(i: &str) -> ParseResult<Token> {
    let base = expect(name, ParseErrorKind::ExpectedBlockName);
    let closing_bracket = expect(char(')'), ParseErrorKind::ExpectedClosingBracket);
    let modifier = preceded(
        char('('),
        cut(terminated(expect(name, ParseErrorKind::ExpectedModifier), closing_bracket)),
    );
    // NOTE: Checked without consuming, so that `tokens` can go on to consume the separating whitespace
    let boundary = expect(peek(alt((whitespace1, eof))), ParseErrorKind::ExpectedWhitespace);
    let parser = terminated(consumed(pair(base, opt(modifier))), cut(boundary));
    map(parser, |(text, (base, modifier))| Token {
        text,
        base,
        modifier,
    })(i)
}

/// Name = { any character except whitespace, "(" and ")" }- ;
fn name(i: &str) -> ParseResult<&str> {
    take_till1(|c: char| c.is_whitespace() || c == '(' || c == ')')(i)
}

fn whitespace0(i: &str) -> ParseResult<&str> {
    take_while(char::is_whitespace)(i)
}

fn whitespace1(i: &str) -> ParseResult<&str> {
    take_while1(char::is_whitespace)(i)
}

fn expect<'s, O>(
    mut parser: impl Parser<&'s str, O, TokenError<'s>>,
    kind: ParseErrorKind,
) -> impl FnMut(&'s str) -> ParseResult<'s, O> {
    move |i| {
        parser
            .parse(i)
            .map_err(|e| e.map(|_| TokenError::new(i, kind)))
    }
}

// Private Types =======================================================================================================

type ParseResult<'s, O> = IResult<&'s str, O, TokenError<'s>>;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct TokenError<'s> {
    input: &'s str,
    kind: ParseErrorKind,
}

impl<'s> TokenError<'s> {
    const fn new(input: &'s str, kind: ParseErrorKind) -> Self {
        Self { input, kind }
    }

    fn finalize(self, sequence: &str) -> ParseError {
        let span = if self.kind == ParseErrorKind::EmptySequence {
            SourceSpan::from(0..sequence.len())
        } else {
            // NOTE: `self.input` is always a suffix of `sequence`, so its offset can be found from their lengths
            let start = sequence.len() - self.input.len();
            let length = self.input.chars().next().map_or(0, char::len_utf8);
            SourceSpan::from(start..start + length)
        };
        // NOTE: The additional space is added so that Diagnostic labels can point to the end of an input
        let sequence = format!("{sequence} ");

        ParseError {
            sequence,
            span,
            kind: self.kind,
        }
    }
}

impl<'s> nom::error::ParseError<&'s str> for TokenError<'s> {
    fn from_error_kind(input: &'s str, kind: ErrorKind) -> Self {
        Self::new(input, ParseErrorKind::NomError(kind))
    }

    fn append(_input: &'s str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl ParseErrorKind {
    const fn label(self) -> &'static str {
        match self {
            Self::EmptySequence => "no building blocks",
            Self::ExpectedBlockName => "expected a block name",
            Self::ExpectedModifier => "expected a modifier",
            Self::ExpectedClosingBracket => "expected ')'",
            Self::ExpectedWhitespace => "expected whitespace",
            Self::NomError(_) => "the region that triggered this bug!",
        }
    }
}

impl Diagnostic for ParseError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.sequence)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.kind.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_with_span(Some(self.kind.label().to_owned()), self.span);
        Some(Box::new(iter::once(label)))
    }
}

// Module Tests ========================================================================================================

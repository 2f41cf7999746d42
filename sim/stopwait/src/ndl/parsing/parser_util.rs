use super::parsing_data::*;
use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, tag_no_case, take_until, take_while1},
    character::complete::{char, none_of, space0, space1},
    combinator::value,
    error::context,
    multi::many0,
    sequence::{delimited, preceded, separated_pair},
};

/// General parsing for any line of our NDL, with its leading tabs already
/// removed.
///
/// Takes in the line and its line number. Returns either an error or the
/// [DecType] it got and the [Params] inside of that declaration.
pub fn general_parser(s: &str, line_num: usize) -> Result<(DecType, Params), ParseError> {
    let syntax = |e: nom::Err<nom::error::VerboseError<&str>>| ParseError::Syntax {
        line: line_num,
        text: s.to_string(),
        reason: e.to_string(),
    };

    // grab everything between brackets '[' and ']'
    let (after, inside) = section(s).map_err(syntax)?;
    if !after.trim().is_empty() {
        Err(ParseError::ExtraInput {
            line: line_num,
            rest: after.trim().to_string(),
        })?
    }

    let (rest, dectype) = get_type(inside).map_err(syntax)?;
    let (rest, args) = arguments(rest).map_err(syntax)?;
    if !rest.trim().is_empty() {
        Err(ParseError::ExtraInput {
            line: line_num,
            rest: rest.trim().to_string(),
        })?
    }

    let mut options = Params::new();
    for (name, value) in args {
        // makes sure that each argument is a unique one, otherwise error
        if options.contains_key(name) {
            Err(ParseError::DuplicateArgument {
                line: line_num,
                name: name.to_string(),
            })?
        }
        if !dectype.arguments().contains(&name) {
            Err(ParseError::UnknownArgument {
                line: line_num,
                dectype,
                name: name.to_string(),
            })?
        }
        options.insert(name.to_string(), value.to_string());
    }

    Ok((dectype, options))
}

/// Splits a line into its indentation depth and the rest of the line. Each
/// tab, or run of four spaces, at the start of the line is one level.
pub fn split_indent(mut line: &str) -> (usize, &str) {
    let mut depth = 0;
    while let Some(rest) = line.strip_prefix('\t').or_else(|| line.strip_prefix("    ")) {
        line = rest;
        depth += 1;
    }
    (depth, line)
}

/// Grabs the type from the beginning of each section in [general_parser].
/// For example, would turn "Node address='0'" into having a dec type and the
/// remainder of the string
fn get_type(input: &str) -> Res<&str, DecType> {
    context(
        "dectype",
        alt((
            value(DecType::Nodes, tag_no_case("Nodes")),
            value(DecType::Node, tag_no_case("Node")),
            value(DecType::Links, tag_no_case("Links")),
            value(DecType::Link, tag_no_case("Link")),
            value(DecType::Routes, tag_no_case("Routes")),
            value(DecType::Route, tag_no_case("Route")),
        )),
    )(input)
}

/// Grabs everything between brackets "[]" in [general_parser].
fn section(input: &str) -> Res<&str, &str> {
    context(
        "section",
        preceded(space0, delimited(char('['), take_until("]"), char(']'))),
    )(input)
}

/// Breaks down the arguments of our input for the [general_parser].
/// For example, turns "a='0' b='1'" into the pairs ("a", "0") and ("b", "1")
fn arguments(input: &str) -> Res<&str, Vec<(&str, &str)>> {
    context(
        "arguments",
        many0(separated_pair(
            preceded(space1, take_while1(is_argument_char)),
            char('='),
            delimited(
                tag("'"),
                alt((escaped(none_of("\\\'"), '\\', tag("'")), tag(""))),
                tag("'"),
            ),
        )),
    )(input)
}

fn is_argument_char(chr: char) -> bool {
    chr.is_ascii_alphanumeric() || chr == '-' || chr == '_'
}

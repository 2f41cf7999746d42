use super::parser_util::{general_parser, split_indent};
use super::parsing_data::*;

/// This is the core parsing logic that runs through an NDL description.
///
/// Takes in the contents of the file. Returns the parsed description, or
/// the first error found.
///
/// A description is made of sections at the top level, each holding
/// declarations indented one tab further:
///
/// ```text
/// [Nodes]
///     [Node address='0' name='perth']
///     [Node address='1']
/// [Links]
///     [Link a='0' b='1' bandwidth='56000' delay='2500' loss='0.1']
/// ```
///
/// Four spaces count as one tab. Blank lines and lines starting with `#` are
/// ignored.
pub fn core_parser(contents: &str) -> Result<Ndl, ParseError> {
    let mut ndl = Ndl::default();
    // the section declarations are currently being added to
    let mut current: Option<DecType> = None;
    let mut seen = vec![];

    for (index, line) in contents.lines().enumerate() {
        let line_num = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (tabs, declaration) = split_indent(line);
        let (dectype, options) = general_parser(declaration, line_num)?;

        match (tabs, current) {
            (0, _) => {
                if dectype.child().is_none() {
                    Err(ParseError::NotASection {
                        line: line_num,
                        dectype,
                    })?
                }
                if seen.contains(&dectype) {
                    Err(ParseError::DuplicateSection {
                        line: line_num,
                        dectype,
                    })?
                }
                if dectype == DecType::Routes {
                    ndl.routes = Some(vec![]);
                }
                seen.push(dectype);
                current = Some(dectype);
            }

            (1, Some(section)) => {
                // section always has a child since only sections are opened
                let expected = section.child().unwrap_or(section);
                if dectype != expected {
                    Err(ParseError::UnexpectedType {
                        line: line_num,
                        expected,
                        found: dectype,
                    })?
                }
                let declaration = Declaration {
                    dectype,
                    options,
                    line: line_num,
                };
                match section {
                    DecType::Nodes => ndl.nodes.push(declaration),
                    DecType::Links => ndl.links.push(declaration),
                    _ => ndl.routes.get_or_insert_with(Vec::new).push(declaration),
                }
            }

            (found, current) => Err(ParseError::Indentation {
                line: line_num,
                expected: usize::from(current.is_some()),
                found,
            })?,
        }
    }

    Ok(ndl)
}

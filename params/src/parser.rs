use crate::error::GrammarError;
use crate::registry::{Directive, DirectiveShape, lookup};

/// Cursor state for the character scan. The grammar mixes two terminator
/// shapes (a space-delimited word and a semicolon-delimited triplet) with
/// backslash escaping, so this is an explicit state machine rather than a
/// regex or a split on separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeforeWord,
    InWord,
    InTripletKey,
    InTripletValue,
    AfterTriplet,
}

/// Characters skipped between directives. A leading `-` is the common case:
/// launch configurations write `-extract` in the flag style.
const SEPARATORS: [char; 3] = ['-', ' ', ';'];

/// Parse a raw mount-parameter string into directives, in source order.
///
/// Single pass over the characters. A backslash makes the next character
/// literal; a semicolon after a recognized triplet keyword switches into the
/// `type;key;value;` form, and a space ends a single-word directive. Keyword
/// membership is checked against the directive table as soon as a token
/// terminates, so malformed input fails before anything runs.
pub fn parse(raw: &str) -> Result<Vec<Directive>, GrammarError> {
    let mut directives = Vec::new();
    let mut state = State::BeforeWord;
    let mut escaped = false;
    let mut token = String::new();
    let mut triplet_keyword = String::new();
    let mut triplet_key = String::new();

    for c in raw.chars() {
        if escaped {
            token.push(c);
            escaped = false;
            continue;
        }
        match state {
            State::BeforeWord => {
                if c == '\\' {
                    // No token exists yet to append the escaped character to.
                    return Err(GrammarError::LeadingEscape);
                }
                if SEPARATORS.contains(&c) {
                    tracing::warn!("ignoring leading mount parameter character {:?}", c);
                } else {
                    token.push(c);
                    state = State::InWord;
                }
            }
            State::InWord => {
                if c == '\\' {
                    escaped = true;
                } else if c == ' ' {
                    finish_single_word(&mut token, &mut directives)?;
                    state = State::BeforeWord;
                } else if c == ';' {
                    let word = std::mem::take(&mut token);
                    match lookup(&word) {
                        Some(spec) if spec.shape == DirectiveShape::Triplet => {
                            triplet_keyword = word;
                        }
                        _ => return Err(GrammarError::UnrecognizedTripletType(word)),
                    }
                    state = State::InTripletKey;
                } else {
                    token.push(c);
                }
            }
            State::InTripletKey => {
                if c == '\\' {
                    escaped = true;
                } else if c == ';' {
                    triplet_key = std::mem::take(&mut token);
                    state = State::InTripletValue;
                } else {
                    token.push(c);
                }
            }
            State::InTripletValue => {
                if c == '\\' {
                    escaped = true;
                } else if c == ';' {
                    let value = std::mem::take(&mut token);
                    let keyword = std::mem::take(&mut triplet_keyword);
                    let spec = lookup(&keyword)
                        .ok_or_else(|| GrammarError::UnknownKeyword(keyword.clone()))?;
                    directives.push(Directive {
                        keyword,
                        args: vec![std::mem::take(&mut triplet_key), value],
                        phase: spec.phase,
                    });
                    state = State::AfterTriplet;
                } else {
                    token.push(c);
                }
            }
            State::AfterTriplet => {
                if c != ' ' {
                    return Err(GrammarError::ExpectedSpaceAfterTriplet(c));
                }
                state = State::BeforeWord;
            }
        }
    }

    match state {
        // A word at end of input has an implicit terminator.
        State::InWord => finish_single_word(&mut token, &mut directives)?,
        State::InTripletKey => return Err(GrammarError::TripletMissingValue),
        State::InTripletValue => return Err(GrammarError::TripletUnterminated),
        State::BeforeWord | State::AfterTriplet => {}
    }

    tracing::debug!("parsed {} mount parameter directive(s)", directives.len());
    Ok(directives)
}

fn finish_single_word(
    token: &mut String,
    directives: &mut Vec<Directive>,
) -> Result<(), GrammarError> {
    let word = std::mem::take(token);
    match lookup(&word) {
        Some(spec) if spec.shape == DirectiveShape::SingleWord => {
            directives.push(Directive {
                keyword: word,
                args: Vec::new(),
                phase: spec.phase,
            });
            Ok(())
        }
        _ => Err(GrammarError::UnrecognizedSingleWord(word)),
    }
}

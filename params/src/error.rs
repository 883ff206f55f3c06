use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("the first character of a mount parameter can't be escaped")]
    LeadingEscape,

    #[error("unrecognized single-word mount parameter {0:?}")]
    UnrecognizedSingleWord(String),

    #[error("unrecognized triplet type {0:?}")]
    UnrecognizedTripletType(String),

    #[error("expected space after triplet mount parameter, got {0:?}")]
    ExpectedSpaceAfterTriplet(char),

    #[error("parameters ended in the middle of a triplet: final element missing")]
    TripletMissingValue,

    #[error("parameters ended while parsing the final element of a triplet: missing semicolon")]
    TripletUnterminated,

    #[error("unknown mount parameter keyword {0:?}")]
    UnknownKeyword(String),

    #[error("wrong number of arguments for {keyword:?}: expected {expected}, got {found}")]
    Arity {
        keyword: String,
        expected: usize,
        found: usize,
    },
}

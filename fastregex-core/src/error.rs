//! Error types for compiling and matching.

/// A malformed pattern, with the byte offset into the pattern where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at position {position}: {kind}")]
pub struct SyntaxError {
    pub position: usize,
    pub kind: SyntaxErrorKind,
}
impl SyntaxError {
    pub const fn new(position: usize, kind: SyntaxErrorKind) -> SyntaxError {
        return SyntaxError { position, kind };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
    #[error("unclosed group")]
    UnclosedGroup,
    #[error("unopened group")]
    UnopenedGroup,
    #[error("unclosed character class")]
    UnclosedClass,
    #[error("invalid character class range {0:?}-{1:?}")]
    InvalidClassRange(char, char),
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid hexadecimal escape")]
    InvalidHexEscape,
    #[error("unknown Unicode class name {0:?}")]
    UnknownClassName(String),
    #[error("unknown POSIX class name {0:?}")]
    UnknownPosixClass(String),
    #[error("repetition operator is missing an expression to repeat")]
    RepetitionMissing,
    #[error("repetition bounds are inverted ({min} > {max})")]
    RepetitionBoundsInverted { min: u32, max: u32 },
    #[error("repetition bound exceeds the limit of {limit}")]
    RepetitionTooLarge { limit: u32 },
    #[error("invalid counted repetition")]
    InvalidRepetition,
    #[error("repetition operator applied to another repetition")]
    NestedRepetition,
    #[error("invalid capture group name")]
    InvalidGroupName,
    #[error("duplicate capture group name {0:?}")]
    DuplicateGroupName(String),
    #[error("unknown flag {0:?}")]
    UnknownFlag(char),
    #[error("flag group sets no flags")]
    EmptyFlagGroup,
}

/// Valid syntax that the automaton model cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedKind {
    #[error("backreference to group {0}")]
    Backreference(u32),
    #[error("named backreference")]
    NamedBackreference,
    #[error("look-ahead assertion")]
    LookAhead,
    #[error("look-behind assertion")]
    LookBehind,
    #[error("atomic group")]
    AtomicGroup,
    #[error("recursive pattern")]
    Recursion,
}

/// An error from compiling a pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("unsupported construct at position {position}: {construct}")]
    UnsupportedConstruct {
        construct: UnsupportedKind,
        position: usize,
    },
    #[error("compiled pattern exceeds the limit of {limit} automaton states")]
    PatternTooLarge { limit: usize },
    /// The generated code disagreed with the automaton it was generated from.
    /// The code is never installed when this happens.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

/// An error from running a search. A search that finds nothing is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("search aborted after exceeding the step budget of {budget} transitions")]
    StepBudgetExceeded { budget: u64 },
}

/// The JIT declined to generate code. The table-driven DFA is used instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("code generation unavailable: {reason}")]
pub struct CodegenUnavailable {
    pub reason: String,
}
impl CodegenUnavailable {
    pub fn new(reason: impl Into<String>) -> CodegenUnavailable {
        return CodegenUnavailable {
            reason: reason.into(),
        };
    }
}

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions { width: i64, height: i64 },
    #[error("expected {expected} samples for the given dimensions, got {actual}")]
    SampleCountMismatch { expected: usize, actual: usize },
    #[error(
        "region ({left},{top})-({right},{bottom}) does not fit inside its parent ({parent_width}x{parent_height})"
    )]
    OutOfParent {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        parent_width: u32,
        parent_height: u32,
    },
    #[error("position stack is empty")]
    EmptyPositionStack,
    #[error("cannot exit {requested} state(s): only {held} held")]
    EmptyStateStack { requested: usize, held: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("unknown sample property `{0}`")]
    UnknownProperty(String),
    #[error("reference sample has no `{property}` value (check #{index})")]
    MissingProperty { index: usize, property: &'static str },
    #[error("no reference pixel at offset ({dx},{dy}) (check #{index})")]
    ReferenceOutOfView { index: usize, dx: i32, dy: i32 },
    #[error("invalid tolerance range [{min}, {max}] for `{property}`")]
    InvalidRange {
        property: &'static str,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("invalid layer dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("the bottom trace configuration cannot be popped")]
    SentinelPop,
}

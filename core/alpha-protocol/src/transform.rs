use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Side of a child token relative to its syntactic head.
///
/// Doubles as the attachment side handed to tree mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[repr(u8)]
pub enum Position {
    Left = 0,
    Right = 1,
}

impl Position {
    /// Value of the `child_position` feature column.
    pub const fn as_feature(self) -> f32 {
        match self {
            Position::Left => 0.,
            Position::Right => 1.,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Left => f.write_str("left"),
            Position::Right => f.write_str("right"),
        }
    }
}

/// How a child's structure is grafted onto its parent's structure.
///
/// Models are trained on integer labels; any label outside the four known
/// codes decodes to [`Transformation::Noop`] and keeps its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum Transformation {
    Grow,
    Apply,
    Nest,
    NestDeep,
    Noop(i32),
}

impl Transformation {
    /// Sentinel for tokens that have no parent and are never classified.
    pub const NOT_APPLICABLE: i32 = -1;
    /// Explicit "leave the parent untouched" training label.
    pub const IGNORE: i32 = 0;
    pub const GROW: i32 = 1;
    pub const APPLY: i32 = 2;
    pub const NEST: i32 = 3;
    pub const NEST_DEEP: i32 = 4;

    pub const fn from_code(code: i32) -> Self {
        match code {
            Self::GROW => Transformation::Grow,
            Self::APPLY => Transformation::Apply,
            Self::NEST => Transformation::Nest,
            Self::NEST_DEEP => Transformation::NestDeep,
            other => Transformation::Noop(other),
        }
    }

    pub const fn code(self) -> i32 {
        match self {
            Transformation::Grow => Self::GROW,
            Transformation::Apply => Self::APPLY,
            Transformation::Nest => Self::NEST,
            Transformation::NestDeep => Self::NEST_DEEP,
            Transformation::Noop(code) => code,
        }
    }

    /// The value recorded for the sentence root.
    pub const fn not_applicable() -> Self {
        Transformation::Noop(Self::NOT_APPLICABLE)
    }

    pub const fn is_noop(self) -> bool {
        matches!(self, Transformation::Noop(_))
    }
}

impl From<i32> for Transformation {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformation::Grow => f.write_str("grow"),
            Transformation::Apply => f.write_str("apply"),
            Transformation::Nest => f.write_str("nest"),
            Transformation::NestDeep => f.write_str("nest_deep"),
            Transformation::Noop(code) => write!(f, "noop({})", code),
        }
    }
}

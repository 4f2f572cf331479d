//! Typed operand values produced by the assembler.
//!
//! Register operands are bounds-checked newtypes: an out-of-range index is
//! rejected when the program is assembled, so the execution engine can index
//! the register file without a range check.

use std::fmt;

/// Numeric registers `$R1` through `$R16`.
pub const NUM_REGISTER_COUNT: u8 = 16;
/// Picture registers `$P1` through `$P8`.
pub const PIC_REGISTER_COUNT: u8 = 8;
/// Face registers `$F1` through `$F8`.
pub const FACE_REGISTER_COUNT: u8 = 8;

macro_rules! register_newtype {
    ($(#[$doc:meta])* $name:ident, $prefix:literal, $count:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub struct $name(u8);

        impl $name {
            /// Builds a register from its 1-based source index, or `None` if
            /// the index is out of range.
            pub fn new(index: u32) -> Option<Self> {
                if (1..=$count as u32).contains(&index) {
                    Some(Self((index - 1) as u8))
                } else {
                    None
                }
            }

            /// Zero-based index into the register bank.
            pub const fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!("$", $prefix, "{}"), self.0 + 1)
            }
        }
    };
}

register_newtype!(
    /// A validated numeric register.
    NumReg, "R", NUM_REGISTER_COUNT
);
register_newtype!(
    /// A validated picture register.
    PicReg, "P", PIC_REGISTER_COUNT
);
register_newtype!(
    /// A validated face register.
    FaceReg, "F", FACE_REGISTER_COUNT
);

/// A numeric operand: either an immediate value or a numeric register read at
/// execution time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumSource {
    Imm(f64),
    Reg(NumReg),
}

/// The operand of `DISPLAY`: anything the display sink can render.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayArg {
    Number(f64),
    Reg(NumReg),
    Pic(PicReg),
    Text(String),
}

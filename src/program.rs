//! Assembled programs.

use std::collections::HashMap;

use crate::isa::Opcode;
use crate::{define_opcodes, for_each_opcode};

macro_rules! define_ops {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $mnemonic:literal => [ $( $field:ident : $kind:ident ),* $(,)? ]
        ),* $(,)?
    ) => {
        /// A decoded operation with fully typed operands.
        ///
        /// Label operands are already resolved to instruction indices, so the
        /// engine never consults the label table while running.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Op {
            $( $(#[$doc])* $name { $( $field: define_opcodes!(@ty $kind) ),* }, )*
        }

        impl Op {
            /// The opcode this operation decodes.
            pub const fn opcode(&self) -> Opcode {
                match self {
                    $( Op::$name { .. } => Opcode::$name, )*
                }
            }

            /// The assembly mnemonic, for error reporting.
            pub const fn mnemonic(&self) -> &'static str {
                self.opcode().mnemonic()
            }
        }
    };
}

for_each_opcode!(define_ops);

/// One assembled instruction: the operation plus the source line it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Instr {
    pub op: Op,
    /// 1-based source line, kept for runtime error reports.
    pub line: usize,
}

/// An immutable assembled program.
///
/// Blank and comment-only source lines produce no instruction, and a label
/// definition on its own line adds no instruction either; labels simply name
/// the index of the next instruction. A label at the very end of the source
/// resolves to `len()`, which is a clean halt when jumped to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    code: Vec<Instr>,
    labels: HashMap<String, usize>,
}

impl Program {
    pub(crate) fn new(code: Vec<Instr>, labels: HashMap<String, usize>) -> Self {
        Self { code, labels }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instr> {
        self.code.get(index)
    }

    /// Resolves a label name to its instruction index.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }
}

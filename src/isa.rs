//! Canonical opcode table.
//!
//! The instruction set is defined once in [`for_each_opcode!`] and consumed by
//! callback macros in this module (the [`Opcode`] enum), in [`crate::program`]
//! (the typed [`crate::program::Op`] enum) and in [`crate::assembler`] (operand
//! parsing). Adding an opcode means adding one line to the table.
//!
//! Each entry reads `Variant = "MNEMONIC" => [field: Kind, ...]` where `Kind`
//! is one of:
//!
//! - `NumOrReg` — an immediate number or a numeric register
//! - `NumReg` / `PicReg` / `FaceReg` — a register of the given bank
//! - `Label` — an identifier resolved to an instruction index
//! - `Show` — anything `DISPLAY` accepts (number, register, or string)
//! - `Str` — a quoted string literal

/// Invokes `$callback!` with the full instruction table.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            /// Does nothing and advances to the next instruction.
            Nop = "NOP" => [],
            /// Stops execution cleanly.
            Halt = "HALT" => [],
            /// Writes a number or another numeric register into `dst`.
            Store = "STORE" => [value: NumOrReg, dst: NumReg],
            /// Copies one numeric register into another.
            Copy = "COPY" => [src: NumReg, dst: NumReg],
            /// Copies one picture register into another.
            CopyPic = "COPY_PIC" => [src: PicReg, dst: PicReg],
            /// Pushes a number or register value onto the numeric stack.
            PushNum = "PUSH_NUM" => [value: NumOrReg],
            /// Pops the numeric stack into a register.
            PopNum = "POP_NUM" => [dst: NumReg],
            /// Pushes the contents of a picture register onto the picture stack.
            PushPic = "PUSH_PIC" => [src: PicReg],
            /// Pops the picture stack into a picture register.
            PopPic = "POP_PIC" => [dst: PicReg],
            /// Pushes the address of a label onto the return-address stack.
            PushReturn = "PUSH_RETURN" => [target: Label],
            /// Pops the return-address stack into the return register.
            PopReturn = "POP_RETURN" => [],
            /// Unconditional jump to a label.
            Jump = "JUMP" => [target: Label],
            /// Pops the return-address stack and jumps to the popped address.
            JumpReturn = "JUMP_RETURN" => [],
            /// Jumps if the operands are equal.
            BranchEq = "BRANCH_EQ" => [a: NumOrReg, b: NumOrReg, target: Label],
            /// Jumps if the operands are not equal.
            BranchNe = "BRANCH_NE" => [a: NumOrReg, b: NumOrReg, target: Label],
            /// Jumps if the first operand is strictly greater.
            BranchGt = "BRANCH_GT" => [a: NumOrReg, b: NumOrReg, target: Label],
            /// Jumps if the first operand is strictly smaller.
            BranchLt = "BRANCH_LT" => [a: NumOrReg, b: NumOrReg, target: Label],
            /// Jumps if the first operand is greater or equal.
            BranchGe = "BRANCH_GE" => [a: NumOrReg, b: NumOrReg, target: Label],
            /// Jumps if the first operand is smaller or equal.
            BranchLe = "BRANCH_LE" => [a: NumOrReg, b: NumOrReg, target: Label],
            /// `dst = a + b`
            Add = "ADD" => [a: NumOrReg, b: NumOrReg, dst: NumReg],
            /// `dst = a - b`
            Sub = "SUB" => [a: NumOrReg, b: NumOrReg, dst: NumReg],
            /// `dst = a * b`
            Mult = "MULT" => [a: NumOrReg, b: NumOrReg, dst: NumReg],
            /// Exact division: `dst = a / b`.
            Div = "DIV" => [a: NumOrReg, b: NumOrReg, dst: NumReg],
            /// Integer division, truncated toward zero.
            IDiv = "IDIV" => [a: NumOrReg, b: NumOrReg, dst: NumReg],
            /// Division rounded to the nearest integer.
            RDiv = "RDIV" => [a: NumOrReg, b: NumOrReg, dst: NumReg],
            /// Launches the drone.
            Takeoff = "TAKEOFF" => [],
            /// Lands the drone.
            Land = "LAND" => [],
            /// Moves forward by a whole-unit magnitude.
            Forward = "FORWARD" => [units: NumOrReg],
            /// Moves backward by a whole-unit magnitude.
            Backward = "BACKWARD" => [units: NumOrReg],
            /// Strafes left by a whole-unit magnitude.
            Left = "LEFT" => [units: NumOrReg],
            /// Strafes right by a whole-unit magnitude.
            Right = "RIGHT" => [units: NumOrReg],
            /// Ascends by a whole-unit magnitude.
            Up = "UP" => [units: NumOrReg],
            /// Descends by a whole-unit magnitude.
            Down = "DOWN" => [units: NumOrReg],
            /// Rotates clockwise by whole degrees.
            RotateCw = "ROTATE_CW" => [degrees: NumOrReg],
            /// Rotates counter-clockwise by whole degrees.
            RotateCcw = "ROTATE_CCW" => [degrees: NumOrReg],
            /// Renders a number, register, or string on the display sink.
            Display = "DISPLAY" => [value: Show],
            /// Captures a camera frame into a picture register.
            TakePic = "TAKE_PIC" => [dst: PicReg],
            /// Reserved: loads an image file into a picture register.
            LoadPic = "LOAD_PIC" => [path: Str, dst: PicReg],
            /// Reserved: detects a face in a picture.
            DetectFace = "DETECT_FACE" => [src: PicReg, index: NumOrReg, dst: FaceReg],
            /// Reserved: matches a face against a picture.
            MatchFace = "MATCH_FACE" => [face: FaceReg, pic: PicReg, dst: NumReg],
        }
    };
}

/// Generates [`Opcode`] and its mnemonic/arity tables from the opcode list.
#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $mnemonic:literal => [ $( $field:ident : $kind:ident ),* $(,)? ]
        ),* $(,)?
    ) => {
        /// A command mnemonic recognized by the assembler.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Opcode {
            $( $(#[$doc])* $name, )*
        }

        impl Opcode {
            /// The assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Looks up an opcode by its (uppercase) mnemonic.
            pub fn from_mnemonic(name: &str) -> Option<Opcode> {
                match name {
                    $( $mnemonic => Some(Opcode::$name), )*
                    _ => None,
                }
            }

            /// Number of operands this opcode requires.
            pub const fn arity(&self) -> usize {
                match self {
                    $( Opcode::$name => <[()]>::len(&[ $( $crate::define_opcodes!(@unit $field) ),* ]), )*
                }
            }
        }
    };

    (@unit $field:ident) => { () };

    // Operand kind to Rust type, shared by the other table consumers.
    (@ty NumOrReg) => { $crate::operand::NumSource };
    (@ty NumReg)   => { $crate::operand::NumReg };
    (@ty PicReg)   => { $crate::operand::PicReg };
    (@ty FaceReg)  => { $crate::operand::FaceReg };
    (@ty Label)    => { usize };
    (@ty Show)     => { $crate::operand::DisplayArg };
    (@ty Str)      => { String };
}

for_each_opcode!(define_opcodes);

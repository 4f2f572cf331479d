//! DroneASM: an assembly-style language and register/stack virtual machine for
//! sequencing drone flight and camera operations.
//!
//! Source programs are assembled into an immutable [`program::Program`] by the
//! [`assembler`], then executed by the [`vm::Vm`] against a [`hardware::Drone`]
//! implementation and a [`hardware::DisplaySink`].

pub mod assembler;
pub mod errors;
pub mod hardware;
pub mod isa;
pub mod operand;
pub mod program;
pub mod store;
pub mod utils;
pub mod vm;

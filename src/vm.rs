//! The fetch-decode-execute engine.
//!
//! A [`Vm`] owns an assembled [`Program`] plus all machine state (register
//! file, stacks, instruction pointer) and drives hardware through the
//! [`Drone`] and [`DisplaySink`] traits. Execution is strictly sequential:
//! fetch the instruction at `ip`, execute it, then advance or jump.
//!
//! Every runtime failure moves the machine to [`RunState::Failed`] and stops
//! execution; `HALT`, running past the last instruction, and an external
//! [`Vm::request_halt`] all stop cleanly in [`RunState::Halted`]. The drone
//! is connected before the first instruction and shut down on every exit
//! path, including failures.

use crate::errors::ExecError;
use crate::hardware::{DisplaySink, DisplayValue, Drone, HardwareFault};
use crate::operand::{DisplayArg, NumReg, NumSource, PicReg};
use crate::program::{Op, Program};
use crate::store::{RegisterFile, Stacks};

/// Where the machine is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunState {
    /// Executing instructions.
    Running,
    /// Stopped cleanly: `HALT`, end of program, or a requested halt.
    Halted,
    /// Aborted by a runtime error.
    Failed,
}

/// What the executed instruction does to the instruction pointer.
enum Flow {
    Next,
    Jump(usize),
    Halt,
}

fn underflow(line: usize, opcode: &'static str, stack: &'static str) -> ExecError {
    ExecError::StackUnderflow {
        line,
        opcode,
        stack,
    }
}

fn empty_pic(line: usize, opcode: &'static str, reg: PicReg) -> ExecError {
    ExecError::EmptyPictureRegister {
        line,
        opcode,
        register: (reg.index() + 1) as u8,
    }
}

fn hw(line: usize, opcode: &'static str, result: Result<(), HardwareFault>) -> Result<Flow, ExecError> {
    match result {
        Ok(()) => Ok(Flow::Next),
        Err(fault) => Err(ExecError::Hardware {
            line,
            opcode,
            fault,
        }),
    }
}

/// The virtual machine.
pub struct Vm {
    program: Program,
    ip: usize,
    state: RunState,
    regs: RegisterFile,
    stacks: Stacks,
    halt_requested: bool,
}

impl Vm {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            ip: 0,
            state: RunState::Running,
            regs: RegisterFile::new(),
            stacks: Stacks::new(),
            halt_requested: false,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Clears all machine state so the program can run again.
    pub fn reset(&mut self) {
        self.ip = 0;
        self.state = RunState::Running;
        self.regs = RegisterFile::new();
        self.stacks = Stacks::new();
        self.halt_requested = false;
    }

    /// Asks the machine to stop cleanly before the next instruction.
    pub fn request_halt(&mut self) {
        self.halt_requested = true;
    }

    /// Runs the program to completion.
    ///
    /// Connects the drone first and shuts it down before returning, whether
    /// the run halted or failed.
    pub fn run(
        &mut self,
        drone: &mut dyn Drone,
        display: &mut dyn DisplaySink,
    ) -> Result<(), ExecError> {
        if let Err(fault) = drone.connect() {
            self.state = RunState::Failed;
            drone.shutdown();
            return Err(ExecError::Connect(fault));
        }
        let result = self.exec_loop(drone, display);
        drone.shutdown();
        if result.is_err() {
            self.state = RunState::Failed;
        }
        result
    }

    fn exec_loop(
        &mut self,
        drone: &mut dyn Drone,
        display: &mut dyn DisplaySink,
    ) -> Result<(), ExecError> {
        while self.state == RunState::Running {
            if self.halt_requested {
                self.state = RunState::Halted;
                break;
            }
            let Some(instr) = self.program.get(self.ip) else {
                // Falling past the last instruction is a clean halt.
                self.state = RunState::Halted;
                break;
            };
            let op = instr.op.clone();
            let line = instr.line;
            match self.step(op, line, drone, display)? {
                Flow::Next => self.ip += 1,
                Flow::Jump(target) => self.ip = target,
                Flow::Halt => self.state = RunState::Halted,
            }
        }
        Ok(())
    }

    fn step(
        &mut self,
        op: Op,
        line: usize,
        drone: &mut dyn Drone,
        display: &mut dyn DisplaySink,
    ) -> Result<Flow, ExecError> {
        match op {
            Op::Nop {} => Ok(Flow::Next),
            Op::Halt {} => Ok(Flow::Halt),

            Op::Store { value, dst } => {
                let v = self.resolve(&value);
                self.regs.set_num(dst, v);
                Ok(Flow::Next)
            }
            Op::Copy { src, dst } => {
                let v = self.regs.num(src);
                self.regs.set_num(dst, v);
                Ok(Flow::Next)
            }
            Op::CopyPic { src, dst } => {
                let v = self.regs.pic(src).cloned();
                self.regs.set_pic(dst, v);
                Ok(Flow::Next)
            }

            Op::PushNum { value } => {
                let v = self.resolve(&value);
                self.stacks.push_num(v);
                Ok(Flow::Next)
            }
            Op::PopNum { dst } => {
                let v = self
                    .stacks
                    .pop_num()
                    .ok_or_else(|| underflow(line, "POP_NUM", "numeric"))?;
                self.regs.set_num(dst, v);
                Ok(Flow::Next)
            }
            Op::PushPic { src } => {
                let pic = self
                    .regs
                    .pic(src)
                    .cloned()
                    .ok_or_else(|| empty_pic(line, "PUSH_PIC", src))?;
                self.stacks.push_pic(pic);
                Ok(Flow::Next)
            }
            Op::PopPic { dst } => {
                let pic = self
                    .stacks
                    .pop_pic()
                    .ok_or_else(|| underflow(line, "POP_PIC", "picture"))?;
                self.regs.set_pic(dst, Some(pic));
                Ok(Flow::Next)
            }

            Op::PushReturn { target } => {
                self.stacks.push_return(target);
                Ok(Flow::Next)
            }
            Op::PopReturn {} => {
                let addr = self
                    .stacks
                    .pop_return()
                    .ok_or_else(|| underflow(line, "POP_RETURN", "return-address"))?;
                self.regs.set_return_address(addr);
                Ok(Flow::Next)
            }
            Op::Jump { target } => Ok(Flow::Jump(target)),
            Op::JumpReturn {} => {
                let addr = self
                    .stacks
                    .pop_return()
                    .ok_or_else(|| underflow(line, "JUMP_RETURN", "return-address"))?;
                self.regs.set_return_address(addr);
                Ok(Flow::Jump(addr))
            }

            Op::BranchEq { a, b, target } => Ok(self.op_branch(&a, &b, target, |x, y| x == y)),
            Op::BranchNe { a, b, target } => Ok(self.op_branch(&a, &b, target, |x, y| x != y)),
            Op::BranchGt { a, b, target } => Ok(self.op_branch(&a, &b, target, |x, y| x > y)),
            Op::BranchLt { a, b, target } => Ok(self.op_branch(&a, &b, target, |x, y| x < y)),
            Op::BranchGe { a, b, target } => Ok(self.op_branch(&a, &b, target, |x, y| x >= y)),
            Op::BranchLe { a, b, target } => Ok(self.op_branch(&a, &b, target, |x, y| x <= y)),

            Op::Add { a, b, dst } => {
                self.op_math(&a, &b, dst, |x, y| x + y);
                Ok(Flow::Next)
            }
            Op::Sub { a, b, dst } => {
                self.op_math(&a, &b, dst, |x, y| x - y);
                Ok(Flow::Next)
            }
            Op::Mult { a, b, dst } => {
                self.op_math(&a, &b, dst, |x, y| x * y);
                Ok(Flow::Next)
            }
            Op::Div { a, b, dst } => {
                self.op_div(&a, &b, dst, line, "DIV", |q| q)?;
                Ok(Flow::Next)
            }
            Op::IDiv { a, b, dst } => {
                self.op_div(&a, &b, dst, line, "IDIV", f64::trunc)?;
                Ok(Flow::Next)
            }
            Op::RDiv { a, b, dst } => {
                self.op_div(&a, &b, dst, line, "RDIV", f64::round)?;
                Ok(Flow::Next)
            }

            Op::Takeoff {} => hw(line, "TAKEOFF", drone.takeoff()),
            Op::Land {} => hw(line, "LAND", drone.land()),
            Op::Forward { units } => {
                let n = self.motion_units(&units);
                hw(line, "FORWARD", drone.forward(n))
            }
            Op::Backward { units } => {
                let n = self.motion_units(&units);
                hw(line, "BACKWARD", drone.backward(n))
            }
            Op::Left { units } => {
                let n = self.motion_units(&units);
                hw(line, "LEFT", drone.left(n))
            }
            Op::Right { units } => {
                let n = self.motion_units(&units);
                hw(line, "RIGHT", drone.right(n))
            }
            Op::Up { units } => {
                let n = self.motion_units(&units);
                hw(line, "UP", drone.up(n))
            }
            Op::Down { units } => {
                let n = self.motion_units(&units);
                hw(line, "DOWN", drone.down(n))
            }
            Op::RotateCw { degrees } => {
                let n = self.motion_units(&degrees);
                hw(line, "ROTATE_CW", drone.rotate_cw(n))
            }
            Op::RotateCcw { degrees } => {
                let n = self.motion_units(&degrees);
                hw(line, "ROTATE_CCW", drone.rotate_ccw(n))
            }

            Op::Display { value } => {
                self.op_display(&value, line, display)?;
                Ok(Flow::Next)
            }
            Op::TakePic { dst } => {
                let pic = drone.take_picture().map_err(|fault| ExecError::Hardware {
                    line,
                    opcode: "TAKE_PIC",
                    fault,
                })?;
                self.regs.set_pic(dst, Some(pic));
                Ok(Flow::Next)
            }

            Op::LoadPic { .. } => Err(ExecError::VisionUnavailable {
                line,
                opcode: "LOAD_PIC",
            }),
            Op::DetectFace { .. } => Err(ExecError::VisionUnavailable {
                line,
                opcode: "DETECT_FACE",
            }),
            Op::MatchFace { .. } => Err(ExecError::VisionUnavailable {
                line,
                opcode: "MATCH_FACE",
            }),
        }
    }

    /// Reads an immediate or register operand.
    fn resolve(&self, value: &NumSource) -> f64 {
        match value {
            NumSource::Imm(v) => *v,
            NumSource::Reg(reg) => self.regs.num(*reg),
        }
    }

    /// Motion magnitudes are truncated to whole units before dispatch.
    fn motion_units(&self, value: &NumSource) -> i64 {
        self.resolve(value).trunc() as i64
    }

    fn op_branch(
        &self,
        a: &NumSource,
        b: &NumSource,
        target: usize,
        cmp: fn(f64, f64) -> bool,
    ) -> Flow {
        if cmp(self.resolve(a), self.resolve(b)) {
            Flow::Jump(target)
        } else {
            Flow::Next
        }
    }

    fn op_math(&mut self, a: &NumSource, b: &NumSource, dst: NumReg, f: fn(f64, f64) -> f64) {
        let v = f(self.resolve(a), self.resolve(b));
        self.regs.set_num(dst, v);
    }

    fn op_div(
        &mut self,
        a: &NumSource,
        b: &NumSource,
        dst: NumReg,
        line: usize,
        opcode: &'static str,
        post: fn(f64) -> f64,
    ) -> Result<(), ExecError> {
        let divisor = self.resolve(b);
        if divisor == 0.0 {
            return Err(ExecError::DivisionByZero { line, opcode });
        }
        let quotient = self.resolve(a) / divisor;
        self.regs.set_num(dst, post(quotient));
        Ok(())
    }

    fn op_display(
        &self,
        value: &DisplayArg,
        line: usize,
        display: &mut dyn DisplaySink,
    ) -> Result<(), ExecError> {
        match value {
            DisplayArg::Number(n) => display.render(DisplayValue::Number(*n)),
            DisplayArg::Reg(reg) => display.render(DisplayValue::Number(self.regs.num(*reg))),
            DisplayArg::Text(s) => display.render(DisplayValue::Text(s)),
            DisplayArg::Pic(reg) => {
                let pic = self
                    .regs
                    .pic(*reg)
                    .ok_or_else(|| empty_pic(line, "DISPLAY", *reg))?;
                display.render(DisplayValue::Picture(pic));
            }
        }
        Ok(())
    }
}

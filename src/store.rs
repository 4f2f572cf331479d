//! The register file and the three typed stacks.
//!
//! Register indices arrive as validated newtypes ([`NumReg`], [`PicReg`],
//! [`FaceReg`]), so none of the accessors can go out of bounds. Stack pops
//! return `Option`; the engine turns `None` into an underflow failure with
//! the instruction context attached.

use crate::hardware::{Face, Picture};
use crate::operand::{FaceReg, NumReg, PicReg};
use crate::operand::{FACE_REGISTER_COUNT, NUM_REGISTER_COUNT, PIC_REGISTER_COUNT};

/// The machine's registers: 16 numeric, 8 picture, 8 face, plus the
/// return-address register.
///
/// Numeric registers start at zero; picture and face registers start empty.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisterFile {
    num: [f64; NUM_REGISTER_COUNT as usize],
    pic: [Option<Picture>; PIC_REGISTER_COUNT as usize],
    face: [Option<Face>; FACE_REGISTER_COUNT as usize],
    return_addr: usize,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            num: [0.0; NUM_REGISTER_COUNT as usize],
            pic: std::array::from_fn(|_| None),
            face: std::array::from_fn(|_| None),
            return_addr: 0,
        }
    }

    pub fn num(&self, reg: NumReg) -> f64 {
        self.num[reg.index()]
    }

    pub fn set_num(&mut self, reg: NumReg, value: f64) {
        self.num[reg.index()] = value;
    }

    pub fn pic(&self, reg: PicReg) -> Option<&Picture> {
        self.pic[reg.index()].as_ref()
    }

    pub fn set_pic(&mut self, reg: PicReg, value: Option<Picture>) {
        self.pic[reg.index()] = value;
    }

    pub fn face(&self, reg: FaceReg) -> Option<&Face> {
        self.face[reg.index()].as_ref()
    }

    pub fn set_face(&mut self, reg: FaceReg, value: Option<Face>) {
        self.face[reg.index()] = value;
    }

    /// The address most recently popped off the return-address stack.
    pub fn return_address(&self) -> usize {
        self.return_addr
    }

    pub(crate) fn set_return_address(&mut self, addr: usize) {
        self.return_addr = addr;
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// The three stacks: numbers, pictures, and return addresses.
///
/// The banks are fully independent; pushing on one never disturbs another.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stacks {
    num: Vec<f64>,
    pic: Vec<Picture>,
    ret: Vec<usize>,
}

impl Stacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_num(&mut self, value: f64) {
        self.num.push(value);
    }

    pub fn pop_num(&mut self) -> Option<f64> {
        self.num.pop()
    }

    pub fn push_pic(&mut self, value: Picture) {
        self.pic.push(value);
    }

    pub fn pop_pic(&mut self) -> Option<Picture> {
        self.pic.pop()
    }

    pub fn push_return(&mut self, addr: usize) {
        self.ret.push(addr);
    }

    pub fn pop_return(&mut self) -> Option<usize> {
        self.ret.pop()
    }

    pub fn num_depth(&self) -> usize {
        self.num.len()
    }

    pub fn pic_depth(&self) -> usize {
        self.pic.len()
    }

    pub fn return_depth(&self) -> usize {
        self.ret.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(index: u32) -> NumReg {
        NumReg::new(index).unwrap()
    }

    #[test]
    fn numeric_registers_default_to_zero() {
        let regs = RegisterFile::new();
        for i in 1..=16 {
            assert_eq!(regs.num(r(i)), 0.0);
        }
    }

    #[test]
    fn numeric_register_read_back() {
        let mut regs = RegisterFile::new();
        regs.set_num(r(1), -2.5);
        regs.set_num(r(16), 1e9);
        assert_eq!(regs.num(r(1)), -2.5);
        assert_eq!(regs.num(r(16)), 1e9);
        assert_eq!(regs.num(r(2)), 0.0);
    }

    #[test]
    fn picture_registers_start_empty() {
        let mut regs = RegisterFile::new();
        let p1 = PicReg::new(1).unwrap();
        assert!(regs.pic(p1).is_none());
        let pic = Picture::blank(4, 4);
        regs.set_pic(p1, Some(pic.clone()));
        assert_eq!(regs.pic(p1), Some(&pic));
        regs.set_pic(p1, None);
        assert!(regs.pic(p1).is_none());
    }

    #[test]
    fn face_register_read_back() {
        let mut regs = RegisterFile::new();
        let f3 = FaceReg::new(3).unwrap();
        assert!(regs.face(f3).is_none());
        regs.set_face(f3, Some(Face::new(7)));
        assert_eq!(regs.face(f3), Some(&Face::new(7)));
    }

    #[test]
    fn return_register_latches() {
        let mut regs = RegisterFile::new();
        assert_eq!(regs.return_address(), 0);
        regs.set_return_address(42);
        assert_eq!(regs.return_address(), 42);
    }

    #[test]
    fn numeric_stack_is_lifo() {
        let mut stacks = Stacks::new();
        stacks.push_num(1.0);
        stacks.push_num(2.5);
        stacks.push_num(-3.0);
        assert_eq!(stacks.num_depth(), 3);
        assert_eq!(stacks.pop_num(), Some(-3.0));
        assert_eq!(stacks.pop_num(), Some(2.5));
        assert_eq!(stacks.pop_num(), Some(1.0));
        assert_eq!(stacks.pop_num(), None);
    }

    #[test]
    fn stacks_are_independent() {
        let mut stacks = Stacks::new();
        stacks.push_num(9.0);
        stacks.push_return(4);
        assert_eq!(stacks.pic_depth(), 0);
        assert_eq!(stacks.pop_pic(), None);
        assert_eq!(stacks.pop_return(), Some(4));
        assert_eq!(stacks.pop_num(), Some(9.0));
    }

    #[test]
    fn return_stack_is_lifo() {
        let mut stacks = Stacks::new();
        stacks.push_return(10);
        stacks.push_return(20);
        assert_eq!(stacks.pop_return(), Some(20));
        assert_eq!(stacks.pop_return(), Some(10));
        assert_eq!(stacks.pop_return(), None);
    }
}

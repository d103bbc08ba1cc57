//! The register VM: frames, closures, the native-function bridge, and the
//! opcode dispatch loop.

mod frame;

pub use frame::Frame;

use crate::bytecode::{BinOpcode, FuncIdx, Instr};
use crate::proto::ModuleProto;
use crate::value::{ClosureObj, Value};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// A fatal runtime condition. Distinct from
/// `Diagnostic`: these only ever arise once a program has already passed
/// compilation, and they unwind the whole frame stack rather than
/// accumulating.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeFault {
    #[error("division by zero")]
    DivisionByZero,
    #[error("array index {index} out of bounds (length {length})")]
    IndexOutOfBounds { index: i64, length: usize },
    #[error("call stack exhausted (max depth {max_depth})")]
    StackOverflow { max_depth: usize },
    #[error("native function `{name}` failed: {message}")]
    NativeFunctionFailure { name: String, message: String },
}

/// Runtime configuration affecting only resource limits, never semantics:
/// the call-frame machine needs *some* recursion bound to stay a machine
/// rather than an unbounded host-stack user.
#[derive(Debug, Clone, Copy)]
pub struct VmLimits {
    pub max_call_depth: usize,
}

impl Default for VmLimits {
    fn default() -> Self {
        Self { max_call_depth: 1024 }
    }
}

/// The virtual machine: global storage plus the active call stack.
pub struct Vm {
    pub globals: Vec<Value>,
    limits: VmLimits,
    frames: Vec<Frame>,
}

impl Vm {
    pub fn new(limits: VmLimits) -> Self {
        Self { globals: Vec::new(), limits, frames: Vec::new() }
    }

    /// Run a module's top-level instructions to completion, returning its
    /// final returned value (`Null` if it never executed a `RETURN`).
    #[instrument(skip(self, module))]
    pub fn run_module(&mut self, module: &Rc<ModuleProto>) -> Result<Value, RuntimeFault> {
        let frame = Frame::for_module(module.clone());
        self.frames.push(frame);
        let result = self.run_current_frame(module);
        self.frames.pop();
        result
    }

    /// Run one REPL chunk against a persistent root frame, creating it on
    /// the first call and rebinding it to each new chunk thereafter so
    /// module-locals and the VM's `globals` survive across submissions.
    /// Unlike `run_module`, the frame is never popped.
    pub fn run_chunk(&mut self, chunk: &Rc<ModuleProto>) -> Result<Value, RuntimeFault> {
        match self.frames.first_mut() {
            Some(frame) => frame.reset_for_chunk(chunk.clone()),
            None => self.frames.push(Frame::for_module(chunk.clone())),
        }
        self.run_current_frame(chunk)
    }

    fn run_current_frame(&mut self, module: &Rc<ModuleProto>) -> Result<Value, RuntimeFault> {
        loop {
            let frame = self.frames.last_mut().expect("active frame");
            let Some(instr) = frame.fetch() else {
                return Ok(Value::Null);
            };
            trace!(ip = frame.pc, instr = %instr, "dispatch");

            if let Some(retval) = self.execute(instr, module)? {
                return Ok(retval);
            }
        }
    }

    /// Execute one instruction against the active frame. Returns `Some(v)`
    /// when the frame retired via `RETURN`, `None` otherwise (including
    /// after a branch, which already advanced `pc` itself per the
    /// "one-before" jump-target convention — see `bytecode::JumpTarget`).
    fn execute(&mut self, instr: Instr, module: &Rc<ModuleProto>) -> Result<Option<Value>, RuntimeFault> {
        match instr {
            Instr::LoadConst { dst, k } => {
                let value = self.frame().constant(k).clone();
                self.frame_mut().set_reg(dst, value);
                self.frame_mut().advance();
            }
            Instr::LoadVar { dst, slot } => {
                let value = self.frame().local(slot).clone();
                self.frame_mut().set_reg(dst, value);
                self.frame_mut().advance();
            }
            Instr::StoreVar { src, slot } => {
                let value = self.frame().reg(src).clone();
                self.frame_mut().set_local(slot, value);
                self.frame_mut().advance();
            }
            Instr::LoadGlobal { dst, slot } => {
                let value = self.globals[slot as usize].clone();
                self.frame_mut().set_reg(dst, value);
                self.frame_mut().advance();
            }
            Instr::AssignGlobal { src, slot } => {
                let value = self.frame().reg(src).clone();
                self.globals[slot as usize] = value;
                self.frame_mut().advance();
            }
            Instr::LoadUpvar { dst, slot } => {
                let value = self.frame().upvalue(slot).borrow().clone();
                self.frame_mut().set_reg(dst, value);
                self.frame_mut().advance();
            }
            Instr::AssignUpvar { src, slot } => {
                let value = self.frame().reg(src).clone();
                *self.frame().upvalue(slot).borrow_mut() = value;
                self.frame_mut().advance();
            }
            Instr::BinOp { op, dst, lhs, rhs } => {
                let lhs = self.frame().reg(lhs).clone();
                let rhs = self.frame().reg(rhs).clone();
                let result = eval_binop(op, &lhs, &rhs)?;
                self.frame_mut().set_reg(dst, result);
                self.frame_mut().advance();
            }
            Instr::Closure { dst, func } => {
                let closure = self.make_closure(func, module);
                self.frame_mut().set_reg(dst, Value::Closure(Rc::new(closure)));
                self.frame_mut().advance();
            }
            Instr::Call { dst, func, args } => {
                let callee = self.frame().reg(func).clone();
                let arg_values: Vec<Value> = args.iter().map(|r| self.frame().reg(*r).clone()).collect();
                let retval = self.call(callee, arg_values, module)?;
                self.frame_mut().set_reg(dst, retval);
                self.frame_mut().advance();
            }
            Instr::Return { src } => {
                let value = self.frame().reg(src).clone();
                return Ok(Some(value));
            }
            Instr::JumpIfFalse { cond, target } => {
                let cond = self.frame().reg(cond).as_bool().expect("type-checked bool operand");
                if !cond {
                    self.frame_mut().pc = target;
                }
                self.frame_mut().advance();
            }
            Instr::Jump { target } => {
                self.frame_mut().pc = target;
                self.frame_mut().advance();
            }
            Instr::MakeArray { dst, elems } => {
                let values = elems.iter().map(|r| self.frame().reg(*r).clone()).collect();
                self.frame_mut().set_reg(dst, Value::array(values));
                self.frame_mut().advance();
            }
            Instr::IndexArray { dst, arr, idx } => {
                let arr = self.frame().reg(arr).clone();
                let idx = self.frame().reg(idx).as_int().expect("type-checked int operand");
                let value = index_array(&arr, idx)?;
                self.frame_mut().set_reg(dst, value);
                self.frame_mut().advance();
            }
        }
        Ok(None)
    }

    fn frame(&self) -> &Frame {
        self.frames.last().expect("active frame")
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("active frame")
    }

    /// Build a closure instance for `func`, wiring each upvalue cell:
    /// direct capture aliases the current frame's local cell, promoting it
    /// to a shared cell on first capture; transitive capture aliases the
    /// current frame's own upvalue cell directly.
    fn make_closure(&mut self, func: FuncIdx, module: &Rc<ModuleProto>) -> ClosureObj {
        let proto = module.function(func).clone();
        let upvalues = proto
            .upvar_descriptors
            .iter()
            .map(|d| {
                if d.is_from_parent {
                    self.frame_mut().promote_local(d.slot_in_parent)
                } else {
                    self.frame().upvalue(d.slot_in_parent).clone()
                }
            })
            .collect();
        ClosureObj { proto, upvalues }
    }

    #[instrument(skip(self, callee, args, module), fields(depth = self.frames.len()))]
    fn call(&mut self, callee: Value, args: Vec<Value>, module: &Rc<ModuleProto>) -> Result<Value, RuntimeFault> {
        match callee {
            Value::Closure(closure) => {
                if self.frames.len() >= self.limits.max_call_depth {
                    return Err(RuntimeFault::StackOverflow { max_depth: self.limits.max_call_depth });
                }
                debug!(name = %closure.proto.name, "calling closure");
                let mut frame = Frame::for_function(closure.clone());
                for (i, arg) in args.into_iter().enumerate() {
                    frame.set_local(i as u16, arg);
                }
                self.frames.push(frame);
                let result = self.run_current_frame(module);
                self.frames.pop();
                result
            }
            Value::Native(native) => {
                debug!(name = %native.name, "calling native function");
                (native.func)(&args)
            }
            other => unreachable!("compiler guarantees callee is Closure or Native, got {other:?}"),
        }
    }
}

fn eval_binop(op: BinOpcode, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeFault> {
    use BinOpcode::*;
    Ok(match op {
        AddInt => Value::Int(int(lhs) + int(rhs)),
        SubInt => Value::Int(int(lhs) - int(rhs)),
        MulInt => Value::Int(int(lhs) * int(rhs)),
        DivInt => {
            let divisor = int(rhs);
            if divisor == 0 {
                return Err(RuntimeFault::DivisionByZero);
            }
            Value::Int(int(lhs) / divisor)
        }
        EqInt => Value::Bool(int(lhs) == int(rhs)),
        NeInt => Value::Bool(int(lhs) != int(rhs)),
        EqBool => Value::Bool(boolean(lhs) == boolean(rhs)),
        NeBool => Value::Bool(boolean(lhs) != boolean(rhs)),
        LtInt => Value::Bool(int(lhs) < int(rhs)),
        LteInt => Value::Bool(int(lhs) <= int(rhs)),
        GtInt => Value::Bool(int(lhs) > int(rhs)),
        GteInt => Value::Bool(int(lhs) >= int(rhs)),
        AndBool => Value::Bool(boolean(lhs) && boolean(rhs)),
        OrBool => Value::Bool(boolean(lhs) || boolean(rhs)),
    })
}

fn int(v: &Value) -> i64 {
    v.as_int().expect("type-checked int operand")
}

fn boolean(v: &Value) -> bool {
    v.as_bool().expect("type-checked bool operand")
}

fn index_array(arr: &Value, idx: i64) -> Result<Value, RuntimeFault> {
    let Value::Array(elems) = arr else {
        panic!("type-checked array operand")
    };
    let elems = elems.borrow();
    if idx < 0 || idx as usize >= elems.len() {
        return Err(RuntimeFault::IndexOutOfBounds { index: idx, length: elems.len() });
    }
    Ok(elems[idx as usize].clone())
}

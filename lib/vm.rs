use std::io::{self, Cursor, Write};
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};
use byteorder::{BigEndian, ReadBytesExt};

use crate::compiler::{compile, Chunk, Opcode};
use crate::table::Table;
use crate::value::{InternedStr, Interner, Value};

const STACK_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

pub struct VirtualMachine {
    stack: Vec<Value>,
    globals: Table,
    interner: Interner,
    out: Box<dyn Write>,
    trace: bool,
    disassemble: bool,
}

impl VirtualMachine {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Build a machine whose `print` output goes to `out` instead of stdout.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self {
            stack: Vec::with_capacity(STACK_SIZE),
            globals: Table::new(),
            interner: Interner::new(),
            out,
            trace: false,
            disassemble: false,
        }
    }

    /// Print the stack and the upcoming instruction before each dispatch.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Print the compiled chunk before running it.
    pub fn set_disassemble(&mut self, disassemble: bool) {
        self.disassemble = disassemble;
    }

    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        let Some(chunk) = compile(source, &mut self.interner) else {
            return InterpretResult::CompileError;
        };
        if self.disassemble {
            eprint!("{}", chunk);
        }
        self.run(&chunk)
    }

    pub fn run(&mut self, chunk: &Chunk) -> InterpretResult {
        let mut ip = Cursor::new(chunk.code());
        match self.execute(chunk, &mut ip) {
            Ok(()) => InterpretResult::Ok,
            Err(err) => {
                // Every byte of an instruction shares its line, so the last
                // consumed byte locates the faulting instruction.
                let offset = (ip.position() as usize).saturating_sub(1);
                eprintln!("{}", err);
                eprintln!("[line {}] in script", chunk.line(offset));
                self.stack.clear();
                InterpretResult::RuntimeError
            }
        }
    }

    fn execute(&mut self, chunk: &Chunk, ip: &mut Cursor<&[u8]>) -> Result<()> {
        while (ip.position() as usize) < chunk.len() {
            if self.trace {
                self.trace_instruction(chunk, ip.position() as usize);
            }

            let opcode = Opcode::try_from(ip.read_u8()?)?;
            match opcode {
                Opcode::Constant => {
                    let index = ip.read_u8()? as usize;
                    let constant = chunk.constant(index).clone();
                    self.push(constant);
                }
                Opcode::Nil => self.push(Value::Nil),
                Opcode::True => self.push(Value::Bool(true)),
                Opcode::False => self.push(Value::Bool(false)),
                Opcode::Pop => {
                    self.pop()?;
                }
                Opcode::GetLocal => {
                    let slot = ip.read_u8()? as usize;
                    let value = self.stack[slot].clone();
                    self.push(value);
                }
                Opcode::SetLocal => {
                    // Assignment is an expression; the value stays on top.
                    let slot = ip.read_u8()? as usize;
                    let value = self.peek(0)?.clone();
                    self.stack[slot] = value;
                }
                Opcode::GetGlobal => {
                    let name = Self::read_string(chunk, ip)?;
                    match self.globals.get(&name) {
                        Some(value) => {
                            let value = value.clone();
                            self.push(value);
                        }
                        None => bail!("Undefined variable '{}'.", name),
                    }
                }
                Opcode::DefineGlobal => {
                    let name = Self::read_string(chunk, ip)?;
                    let value = self.pop()?;
                    self.globals.set(name, value);
                }
                Opcode::SetGlobal => {
                    let name = Self::read_string(chunk, ip)?;
                    let value = self.peek(0)?.clone();
                    if self.globals.set(Rc::clone(&name), value) {
                        // The set just created the variable; undo it so a
                        // failed assignment leaves the table unchanged.
                        self.globals.delete(&name);
                        bail!("Undefined variable '{}'.", name);
                    }
                }
                Opcode::Equal => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.push(Value::Bool(left == right));
                }
                Opcode::Greater
                | Opcode::Less
                | Opcode::Subtract
                | Opcode::Multiply
                | Opcode::Divide => {
                    self.execute_numeric_binary(opcode)?;
                }
                Opcode::Add => {
                    self.execute_add()?;
                }
                Opcode::Not => {
                    let value = self.pop()?;
                    self.push(Value::Bool(value.is_falsey()));
                }
                Opcode::Negate => {
                    let value = match self.peek(0)? {
                        Value::Number(value) => *value,
                        _ => bail!("Operand must be a number."),
                    };
                    self.pop()?;
                    self.push(Value::Number(-value));
                }
                Opcode::Print => {
                    let value = self.pop()?;
                    writeln!(self.out, "{}", value)?;
                }
                Opcode::Jump => {
                    let offset = ip.read_u16::<BigEndian>()? as u64;
                    ip.set_position(ip.position() + offset);
                }
                Opcode::JumpIfFalse => {
                    // Leaves the condition in place; the compiled statement
                    // pops it on each path.
                    let offset = ip.read_u16::<BigEndian>()? as u64;
                    if self.peek(0)?.is_falsey() {
                        ip.set_position(ip.position() + offset);
                    }
                }
                Opcode::Loop => {
                    let offset = ip.read_u16::<BigEndian>()? as u64;
                    ip.set_position(ip.position() - offset);
                }
                Opcode::Return => return Ok(()),
            }
        }
        Ok(())
    }

    fn execute_numeric_binary(&mut self, opcode: Opcode) -> Result<()> {
        match (self.peek(1)?, self.peek(0)?) {
            (Value::Number(_), Value::Number(_)) => {}
            _ => bail!("Operands must be numbers."),
        }

        let right = self.pop_number()?;
        let left = self.pop_number()?;
        let result = match opcode {
            Opcode::Greater => Value::Bool(left > right),
            Opcode::Less => Value::Bool(left < right),
            Opcode::Subtract => Value::Number(left - right),
            Opcode::Multiply => Value::Number(left * right),
            Opcode::Divide => Value::Number(left / right),
            _ => bail!("unknown numeric operator: {:?}", opcode),
        };
        self.push(result);
        Ok(())
    }

    fn execute_add(&mut self) -> Result<()> {
        match (self.peek(1)?, self.peek(0)?) {
            (Value::Number(_), Value::Number(_)) => {
                let right = self.pop_number()?;
                let left = self.pop_number()?;
                self.push(Value::Number(left + right));
            }
            (Value::Str(_), Value::Str(_)) => {
                let right = self.pop()?;
                let left = self.pop()?;
                let handle = self.interner.intern_owned(format!("{}{}", left, right));
                self.push(Value::Str(handle));
            }
            _ => bail!("Operands must be two numbers or two strings."),
        }
        Ok(())
    }

    fn read_string(chunk: &Chunk, ip: &mut Cursor<&[u8]>) -> Result<Rc<InternedStr>> {
        let index = ip.read_u8()? as usize;
        match chunk.constant(index) {
            Value::Str(name) => Ok(Rc::clone(name)),
            value => bail!("expected a string constant, found {}", value),
        }
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or_else(|| anyhow!("stack underflow"))
    }

    fn pop_number(&mut self) -> Result<f64> {
        match self.pop()? {
            Value::Number(value) => Ok(value),
            value => bail!("expected a number, found {}", value),
        }
    }

    fn peek(&self, distance: usize) -> Result<&Value> {
        let index = self
            .stack
            .len()
            .checked_sub(1 + distance)
            .ok_or_else(|| anyhow!("stack underflow"))?;
        Ok(&self.stack[index])
    }

    fn trace_instruction(&self, chunk: &Chunk, offset: usize) {
        let mut stack_line = String::from("          ");
        for value in &self.stack {
            stack_line.push_str(&format!("[ {} ]", value));
        }
        eprintln!("{}", stack_line);
        let (text, _) = chunk.disassemble_instruction(offset);
        eprintln!("{}", text);
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new()
    }
}

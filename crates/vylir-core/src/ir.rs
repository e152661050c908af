use crate::source_location::Position;
use crate::types::Type;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    Memory,
    Storage,
    Calldata,
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageClass::Memory => write!(f, "memory"),
            StorageClass::Storage => write!(f, "storage"),
            StorageClass::Calldata => write!(f, "calldata"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Seq,
    Pass,
    If,
    Repeat,
    With,
    Set,
    Multi,
    MLoad,
    MStore,
    MStore8,
    MCopy,
    SLoad,
    SStore,
    CalldataLoad,
    CalldataCopy,
    CalldataSize,
    Add,
    Sub,
    Mul,
    Div,
    SDiv,
    Mod,
    SMod,
    Exp,
    Lt,
    Gt,
    Slt,
    Sgt,
    Eq,
    IsZero,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    Sha3,
    Sha3_32,
    Ceil32,
    Clamp,
    ClampLt,
    UClampLt,
    UClampLe,
    Assert,
    AssertReason,
    AssertUnreachable,
    Debugger,
    Break,
    Continue,
    Return,
    Revert,
    Log(u8),
    Pop,
    Call,
    StaticCall,
    Gas,
    Caller,
    CallValue,
    SelfAddress,
}

impl Opcode {
    pub fn name(&self) -> String {
        let name = match self {
            Opcode::Seq => "seq",
            Opcode::Pass => "pass",
            Opcode::If => "if",
            Opcode::Repeat => "repeat",
            Opcode::With => "with",
            Opcode::Set => "set",
            Opcode::Multi => "multi",
            Opcode::MLoad => "mload",
            Opcode::MStore => "mstore",
            Opcode::MStore8 => "mstore8",
            Opcode::MCopy => "mcopy",
            Opcode::SLoad => "sload",
            Opcode::SStore => "sstore",
            Opcode::CalldataLoad => "calldataload",
            Opcode::CalldataCopy => "calldatacopy",
            Opcode::CalldataSize => "calldatasize",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::SDiv => "sdiv",
            Opcode::Mod => "mod",
            Opcode::SMod => "smod",
            Opcode::Exp => "exp",
            Opcode::Lt => "lt",
            Opcode::Gt => "gt",
            Opcode::Slt => "slt",
            Opcode::Sgt => "sgt",
            Opcode::Eq => "eq",
            Opcode::IsZero => "iszero",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Not => "not",
            Opcode::Shl => "shl",
            Opcode::Shr => "shr",
            Opcode::Sha3 => "sha3",
            Opcode::Sha3_32 => "sha3_32",
            Opcode::Ceil32 => "ceil32",
            Opcode::Clamp => "clamp",
            Opcode::ClampLt => "clamplt",
            Opcode::UClampLt => "uclamplt",
            Opcode::UClampLe => "uclample",
            Opcode::Assert => "assert",
            Opcode::AssertReason => "assert_reason",
            Opcode::AssertUnreachable => "assert_unreachable",
            Opcode::Debugger => "debugger",
            Opcode::Break => "break",
            Opcode::Continue => "continue",
            Opcode::Return => "return",
            Opcode::Revert => "revert",
            Opcode::Log(n) => return format!("log{}", n),
            Opcode::Pop => "pop",
            Opcode::Call => "call",
            Opcode::StaticCall => "staticcall",
            Opcode::Gas => "gas",
            Opcode::Caller => "caller",
            Opcode::CallValue => "callvalue",
            Opcode::SelfAddress => "address",
        };
        name.to_string()
    }

    fn is_zero_valent(&self) -> bool {
        matches!(
            self,
            Opcode::Pass
                | Opcode::Repeat
                | Opcode::Set
                | Opcode::MStore
                | Opcode::MStore8
                | Opcode::MCopy
                | Opcode::SStore
                | Opcode::CalldataCopy
                | Opcode::Assert
                | Opcode::AssertReason
                | Opcode::AssertUnreachable
                | Opcode::Debugger
                | Opcode::Break
                | Opcode::Continue
                | Opcode::Return
                | Opcode::Revert
                | Opcode::Log(_)
                | Opcode::Pop
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrValue {
    Int(BigInt),
    Op(Opcode),
    /// A name bound by an enclosing `with`, or a raw symbol.
    Var(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrNode {
    pub value: IrValue,
    pub args: Vec<IrNode>,
    pub typ: Option<Type>,
    pub location: Option<StorageClass>,
    pub pos: Option<Position>,
    pub valency: u8,
    pub annotation: Option<String>,
    pub mutable: bool,
}

impl IrNode {
    fn leaf(value: IrValue) -> Self {
        Self {
            value,
            args: Vec::new(),
            typ: None,
            location: None,
            pos: None,
            valency: 1,
            annotation: None,
            mutable: true,
        }
    }

    pub fn int(value: impl Into<BigInt>) -> Self {
        Self::leaf(IrValue::Int(value.into()))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::leaf(IrValue::Var(name.into()))
    }

    pub fn op(opcode: Opcode, args: Vec<IrNode>) -> Self {
        let valency = match opcode {
            Opcode::Seq => args.last().map_or(0, |a| a.valency),
            Opcode::If => {
                if args.len() == 3 {
                    args[1].valency
                } else {
                    0
                }
            }
            Opcode::With => args.get(2).map_or(0, |body| body.valency),
            op if op.is_zero_valent() => 0,
            _ => 1,
        };
        Self {
            value: IrValue::Op(opcode),
            args,
            typ: None,
            location: None,
            pos: None,
            valency,
            annotation: None,
            mutable: true,
        }
    }

    pub fn seq(args: Vec<IrNode>) -> Self {
        Self::op(Opcode::Seq, args)
    }

    pub fn pass() -> Self {
        Self::op(Opcode::Pass, Vec::new())
    }

    pub fn with_type(mut self, typ: Type) -> Self {
        self.typ = Some(typ);
        self
    }

    pub fn at(mut self, pos: Option<Position>) -> Self {
        self.pos = pos;
        self
    }

    pub fn located(mut self, location: StorageClass) -> Self {
        self.location = Some(location);
        self
    }

    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn immutable(mut self) -> Self {
        self.mutable = false;
        self
    }

    pub fn zero_valent(mut self) -> Self {
        self.valency = 0;
        self
    }

    pub fn opcode(&self) -> Option<Opcode> {
        match self.value {
            IrValue::Op(op) => Some(op),
            _ => None,
        }
    }

    pub fn is_op(&self, opcode: Opcode) -> bool {
        self.opcode() == Some(opcode)
    }

    pub fn literal_value(&self) -> Option<&BigInt> {
        match &self.value {
            IrValue::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Loads the value behind a located node; unlocated nodes are already values.
    pub fn unwrap_location(self) -> IrNode {
        let load = match self.location {
            Some(StorageClass::Memory) => Opcode::MLoad,
            Some(StorageClass::Storage) => Opcode::SLoad,
            Some(StorageClass::Calldata) => Opcode::CalldataLoad,
            None => return self,
        };
        let typ = self.typ.clone();
        let pos = self.pos;
        let node = IrNode::op(load, vec![self]).at(pos);
        match typ {
            Some(t) => node.with_type(t),
            None => node,
        }
    }
}

impl fmt::Display for IrNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = match &self.value {
            IrValue::Int(v) => v.to_string(),
            IrValue::Op(op) => op.name(),
            IrValue::Var(name) => name.clone(),
        };
        if self.args.is_empty() {
            return write!(f, "{}", head);
        }
        write!(f, "({}", head)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        write!(f, ")")
    }
}

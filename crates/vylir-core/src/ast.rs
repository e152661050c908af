//! Statement and expression vocabulary produced by the host parser.

use crate::source_location::Position;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub func: Box<Expr>,
    pub args: Vec<Expr>,
    pub keywords: Vec<Keyword>,
}

impl Call {
    pub fn new(func: Expr, args: Vec<Expr>) -> Self {
        Self {
            func: Box::new(func),
            args,
            keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Name(String),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Int(BigInt),
    Str(String),
    Bytes(Vec<u8>),
    Bool(bool),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Call(Call),
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    Compare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
}

impl ExprKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Name(_) => "Name",
            ExprKind::Attribute { .. } => "Attribute",
            ExprKind::Subscript { .. } => "Subscript",
            ExprKind::Int(_) => "Int",
            ExprKind::Str(_) => "Str",
            ExprKind::Bytes(_) => "Bytes",
            ExprKind::Bool(_) => "NameConstant",
            ExprKind::List(_) => "List",
            ExprKind::Tuple(_) => "Tuple",
            ExprKind::Call(_) => "Call",
            ExprKind::BinOp { .. } => "BinOp",
            ExprKind::UnaryOp { .. } => "UnaryOp",
            ExprKind::BoolOp { .. } => "BoolOp",
            ExprKind::Compare { .. } => "Compare",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Position) -> Self {
        Self { kind, pos }
    }

    pub fn name(id: impl Into<String>, pos: Position) -> Self {
        Self::new(ExprKind::Name(id.into()), pos)
    }

    pub fn int(value: impl Into<BigInt>, pos: Position) -> Self {
        Self::new(ExprKind::Int(value.into()), pos)
    }

    pub fn attribute(value: Expr, attr: impl Into<String>, pos: Position) -> Self {
        Self::new(
            ExprKind::Attribute {
                value: Box::new(value),
                attr: attr.into(),
            },
            pos,
        )
    }

    pub fn subscript(value: Expr, index: Expr, pos: Position) -> Self {
        Self::new(
            ExprKind::Subscript {
                value: Box::new(value),
                index: Box::new(index),
            },
            pos,
        )
    }

    pub fn binop(left: Expr, op: BinOp, right: Expr, pos: Position) -> Self {
        Self::new(
            ExprKind::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            pos,
        )
    }

    pub fn call(func: Expr, args: Vec<Expr>, pos: Position) -> Self {
        Self::new(ExprKind::Call(Call::new(func, args)), pos)
    }

    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_name(&self, id: &str) -> bool {
        self.as_name() == Some(id)
    }

    pub fn int_literal(&self) -> Option<&BigInt> {
        match &self.kind {
            ExprKind::Int(v) => Some(v),
            _ => None,
        }
    }

    /// `a.b.c` for chains of attributes rooted at a name.
    pub fn dotted_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Name(id) => Some(id.clone()),
            ExprKind::Attribute { value, attr } => {
                value.dotted_name().map(|base| format!("{}.{}", base, attr))
            }
            _ => None,
        }
    }

    /// Names reachable through operator sub-expressions only; calls, subscripts and attributes
    /// are opaque.
    pub fn operand_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_operand_names(&mut names);
        names
    }

    fn collect_operand_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match &self.kind {
            ExprKind::BinOp { left, right, .. } | ExprKind::Compare { left, right, .. } => {
                right.collect_operand_names(names);
                left.collect_operand_names(names);
            }
            ExprKind::UnaryOp { operand, .. } => operand.collect_operand_names(names),
            ExprKind::BoolOp { values, .. } => {
                for value in values {
                    value.collect_operand_names(names);
                }
            }
            ExprKind::Name(id) => names.push(id),
            _ => {}
        }
    }

    /// Tree equality ignoring source positions.
    pub fn structurally_eq(&self, other: &Expr) -> bool {
        use ExprKind as K;

        fn all_eq(a: &[Expr], b: &[Expr]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structurally_eq(y))
        }

        match (&self.kind, &other.kind) {
            (K::Name(a), K::Name(b)) => a == b,
            (K::Attribute { value: v1, attr: a1 }, K::Attribute { value: v2, attr: a2 }) => {
                a1 == a2 && v1.structurally_eq(v2)
            }
            (K::Subscript { value: v1, index: i1 }, K::Subscript { value: v2, index: i2 }) => {
                v1.structurally_eq(v2) && i1.structurally_eq(i2)
            }
            (K::Int(a), K::Int(b)) => a == b,
            (K::Str(a), K::Str(b)) => a == b,
            (K::Bytes(a), K::Bytes(b)) => a == b,
            (K::Bool(a), K::Bool(b)) => a == b,
            (K::List(a), K::List(b)) | (K::Tuple(a), K::Tuple(b)) => all_eq(a, b),
            (K::Call(c1), K::Call(c2)) => {
                c1.func.structurally_eq(&c2.func)
                    && all_eq(&c1.args, &c2.args)
                    && c1.keywords.len() == c2.keywords.len()
                    && c1
                        .keywords
                        .iter()
                        .zip(&c2.keywords)
                        .all(|(k1, k2)| k1.name == k2.name && k1.value.structurally_eq(&k2.value))
            }
            (
                K::BinOp {
                    left: l1,
                    op: o1,
                    right: r1,
                },
                K::BinOp {
                    left: l2,
                    op: o2,
                    right: r2,
                },
            ) => o1 == o2 && l1.structurally_eq(l2) && r1.structurally_eq(r2),
            (
                K::Compare {
                    left: l1,
                    op: o1,
                    right: r1,
                },
                K::Compare {
                    left: l2,
                    op: o2,
                    right: r2,
                },
            ) => o1 == o2 && l1.structurally_eq(l2) && r1.structurally_eq(r2),
            (
                K::UnaryOp {
                    op: o1,
                    operand: a,
                },
                K::UnaryOp {
                    op: o2,
                    operand: b,
                },
            ) => o1 == o2 && a.structurally_eq(b),
            (K::BoolOp { op: o1, values: a }, K::BoolOp { op: o2, values: b }) => {
                o1 == o2 && all_eq(a, b)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// An expression evaluated for its side effects: calls, or the bare debugger trap.
    Expr(Expr),
    Pass,
    Raise {
        exc: Option<Expr>,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    Break,
    Continue,
    Return {
        value: Option<Expr>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    Delete {
        targets: Vec<Expr>,
    },
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    Import(Vec<String>),
    Try,
    With,
}

impl StmtKind {
    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::Expr(_) => "Expr",
            StmtKind::Pass => "Pass",
            StmtKind::Raise { .. } => "Raise",
            StmtKind::AnnAssign { .. } => "AnnAssign",
            StmtKind::Assign { .. } => "Assign",
            StmtKind::If { .. } => "If",
            StmtKind::Assert { .. } => "Assert",
            StmtKind::For { .. } => "For",
            StmtKind::AugAssign { .. } => "AugAssign",
            StmtKind::Break => "Break",
            StmtKind::Continue => "Continue",
            StmtKind::Return { .. } => "Return",
            StmtKind::While { .. } => "While",
            StmtKind::Delete { .. } => "Delete",
            StmtKind::Global(_) => "Global",
            StmtKind::Nonlocal(_) => "Nonlocal",
            StmtKind::Import(_) => "Import",
            StmtKind::Try => "Try",
            StmtKind::With => "With",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Position) -> Self {
        Self { kind, pos }
    }
}

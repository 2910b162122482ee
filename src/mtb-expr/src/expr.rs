//! Expression trees
//!
//! Nodes are immutable once built and exclusively own their children; trees
//! are acyclic. The `Display` form of an expression is its surface syntax,
//! used for default axis names and as the expression-result cache key.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use mtb_shared::{Result, Value};

/// Elementwise binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Logical AND (booleans)
    And,
    /// Logical OR (booleans)
    Or,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Equality
    Eq,
    /// Inequality
    Ne,
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division (always widens to float)
    Div,
}

impl BinaryOp {
    /// Surface token for display
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Elementwise unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical NOT (booleans)
    Not,
    /// Numeric negation
    Neg,
}

/// A vectorized function call: positional and keyword argument expressions
/// plus an optional filter expression that composes with the context's
/// ambient filter.
#[derive(Debug, Clone)]
pub struct FnCall {
    /// Function name, resolved against the registry at evaluation time
    pub name: String,
    /// Positional argument expressions
    pub args: Vec<Expr>,
    /// Keyword argument expressions, in insertion order
    pub kwargs: IndexMap<String, Expr>,
    /// Per-call filter (the `FilteredCall` shape)
    pub filter: Option<Box<Expr>>,
}

/// An expression defined in terms of other expressions, built lazily on
/// first evaluation. The built tree is a single-assignment cell owned by
/// the node: populated once, never replaced, no cross-node sharing.
#[derive(Clone)]
pub struct Compound {
    def: Arc<dyn CompoundDef>,
    built: Arc<OnceCell<Expr>>,
}

/// Definition of a compound expression
pub trait CompoundDef: Send + Sync {
    /// Display name of the compound
    fn name(&self) -> &str;
    /// Construct the equivalent expression tree
    fn build(&self) -> Result<Expr>;
}

impl Compound {
    /// Wrap a compound definition
    pub fn new(def: Arc<dyn CompoundDef>) -> Self {
        Self {
            def,
            built: Arc::new(OnceCell::new()),
        }
    }

    /// The equivalent expression tree, built on first access
    pub fn complete_expr(&self) -> Result<&Expr> {
        self.built.get_or_try_init(|| self.def.build())
    }

    /// Display name of the compound
    #[must_use]
    pub fn name(&self) -> &str {
        self.def.name()
    }
}

impl fmt::Debug for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compound")
            .field("name", &self.def.name())
            .field("built", &self.built.get().is_some())
            .finish()
    }
}

/// Polymorphic expression tree node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Named lookup in a context
    Variable(String),
    /// Constant value
    Literal(Value),
    /// Literal list of expressions (evaluates to an array)
    List(Vec<Expr>),
    /// Elementwise unary operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        expr: Box<Expr>,
    },
    /// Elementwise binary operator with scalar broadcasting
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Vectorized function call
    Call(FnCall),
    /// Lazily-built compound expression
    Compound(Compound),
}

impl Expr {
    /// Variable reference
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Variable(name.into())
    }

    /// Constant
    #[must_use]
    pub fn lit(value: Value) -> Expr {
        Expr::Literal(value)
    }

    /// Function call with positional arguments
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call(FnCall {
            name: name.into(),
            args,
            kwargs: IndexMap::new(),
            filter: None,
        })
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Logical AND
    #[must_use]
    pub fn and(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::And, self, rhs)
    }

    /// Logical OR
    #[must_use]
    pub fn or(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Or, self, rhs)
    }

    /// Less than
    #[must_use]
    pub fn lt(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Lt, self, rhs)
    }

    /// Less than or equal
    #[must_use]
    pub fn le(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Le, self, rhs)
    }

    /// Greater than
    #[must_use]
    pub fn gt(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Gt, self, rhs)
    }

    /// Greater than or equal
    #[must_use]
    pub fn ge(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Ge, self, rhs)
    }

    /// Equality
    #[must_use]
    pub fn eq(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Eq, self, rhs)
    }

    /// Inequality
    #[must_use]
    pub fn ne(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Ne, self, rhs)
    }

    /// Addition
    #[must_use]
    pub fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Add, self, rhs)
    }

    /// Subtraction
    #[must_use]
    pub fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Sub, self, rhs)
    }

    /// Multiplication
    #[must_use]
    pub fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Mul, self, rhs)
    }

    /// Division
    #[must_use]
    pub fn div(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Div, self, rhs)
    }

    /// Logical NOT
    #[must_use]
    pub fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            expr: Box::new(self),
        }
    }

    /// Numeric negation
    #[must_use]
    pub fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Neg,
            expr: Box::new(self),
        }
    }
}

impl FnCall {
    /// Add a keyword argument
    #[must_use]
    pub fn with_kwarg(mut self, name: impl Into<String>, value: Expr) -> Self {
        self.kwargs.insert(name.into(), value);
        self
    }

    /// Attach a per-call filter
    #[must_use]
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }
}

impl Expr {
    /// Add a keyword argument (call expressions only; no-op otherwise)
    #[must_use]
    pub fn with_kwarg(self, name: impl Into<String>, value: Expr) -> Expr {
        match self {
            Expr::Call(call) => Expr::Call(call.with_kwarg(name, value)),
            other => other,
        }
    }

    /// Attach a per-call filter (call expressions only; no-op otherwise)
    #[must_use]
    pub fn with_filter(self, filter: Expr) -> Expr {
        match self {
            Expr::Call(call) => Expr::Call(call.with_filter(filter)),
            other => other,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Expr::Unary { op, expr } => match op {
                UnaryOp::Not => write!(f, "not {expr}"),
                UnaryOp::Neg => write!(f, "-{expr}"),
            },
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.token()),
            Expr::Call(call) => write!(f, "{call}"),
            Expr::Compound(compound) => write!(f, "{}()", compound.name()),
        }
    }
}

impl fmt::Display for FnCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        let mut first = true;
        for arg in &self.args {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
            first = false;
        }
        for (key, value) in &self.kwargs {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        if let Some(filter) = &self.filter {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "filter={filter}")?;
        }
        write!(f, ")")
    }
}

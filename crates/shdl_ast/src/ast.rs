//! Expanded-SHDL abstract syntax tree.
//!
//! Mirrors the data model of the source language before any flattening:
//! hierarchical instances, generators, bit-slice expanders, and named
//! constants are all still present. [`crate::parser`] builds this tree
//! directly from a token stream.

use serde::{Deserialize, Serialize};
use shdl_source::Span;

/// An identifier that may carry a generator-variable substitution suffix,
/// i.e. either a plain name (`g1`) or a templated one (`g{i}`, expanding to
/// `g` concatenated with the decimal value of `i` at generator-expansion
/// time).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplatedIdent {
    /// The literal prefix of the identifier.
    pub base: String,
    /// The `{expr}` substitution suffix, if present.
    pub subst: Option<Expr>,
    /// The source span covering the whole identifier (including `{expr}`).
    pub span: Span,
}

impl TemplatedIdent {
    /// Creates a plain (non-templated) identifier.
    pub fn plain(base: impl Into<String>, span: Span) -> Self {
        Self {
            base: base.into(),
            subst: None,
            span,
        }
    }

    /// Returns `true` if this identifier has no `{expr}` substitution.
    pub fn is_plain(&self) -> bool {
        self.subst.is_none()
    }
}

/// An integer arithmetic expression over literals and generator loop
/// variables, built from `+`, `-`, `*`, and `{…}` grouping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Expr {
    /// An integer literal.
    Int(i64, Span),
    /// A reference to a generator loop variable.
    Var(String, Span),
    /// `a + b`
    Add(Box<Expr>, Box<Expr>, Span),
    /// `a - b`
    Sub(Box<Expr>, Box<Expr>, Span),
    /// `a * b`
    Mul(Box<Expr>, Box<Expr>, Span),
}

impl Expr {
    /// Returns the span covering this expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Int(_, s) | Expr::Var(_, s) | Expr::Add(_, _, s) | Expr::Sub(_, _, s) | Expr::Mul(_, _, s) => *s,
        }
    }
}

/// A port declaration: a name plus a positive bit width (default 1 if
/// unspecified in source).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Port {
    /// The port's identifier.
    pub name: String,
    /// The port's bit width. Bit 1 is the LSB, bit `width` is the MSB.
    pub width: u32,
    /// The source span of the port declaration.
    pub span: Span,
}

/// An index or range suffix on a [`SignalRef`]: `[expr]`, `[:k]`, `[k:]`, or
/// `[a:b]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum IndexSpec {
    /// `[expr]` — a single bit index.
    Bit(Expr),
    /// `[:k]` — the low `k` bits, expander form.
    SliceTo(Expr),
    /// `[k:]` — bits from `k` up to the enclosing port's width, expander form.
    SliceFrom(Expr),
    /// `[a:b]` — an explicit closed range, expander form.
    SliceRange(Expr, Expr),
}

/// A reference to a signal: a component port, an instance port
/// (`inst.port`), or a named constant, with an optional index/slice.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignalRef {
    /// The base identifier: a port name, instance name, or constant name.
    pub base: TemplatedIdent,
    /// The member name when this is `instance.port`.
    pub member: Option<TemplatedIdent>,
    /// The optional index/slice suffix.
    pub index: Option<IndexSpec>,
    /// The full span of this signal reference.
    pub span: Span,
}

/// A local instance declaration: `name: Type;`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstanceDecl {
    /// The instance's local name.
    pub name: TemplatedIdent,
    /// The referenced type: a primitive keyword (`AND`, `OR`, `NOT`, `XOR`)
    /// or another component's name.
    pub type_name: String,
    /// The source span of the declaration.
    pub span: Span,
}

/// A named constant: `name[width] = value;`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Constant {
    /// The constant's identifier.
    pub name: TemplatedIdent,
    /// The explicit width, if given in source.
    pub width: Option<u32>,
    /// The constant's non-negative integer value.
    pub value: u64,
    /// The source span of the declaration.
    pub span: Span,
}

/// One bound of a generator's iteration range.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RangeSpec {
    /// `[k]` — singleton `k`, or `1..k` if it is the sole item in the list.
    Single(i64, Span),
    /// `[a:b]` — a closed range.
    Closed(i64, i64, Span),
    /// `[a:]` — an open-lower range whose upper bound is supplied by the
    /// enclosing signal width at the use site.
    OpenUpper(i64, Span),
    /// `[:b]` — an open range from 1 up to `b`.
    OpenLower(i64, Span),
}

/// A statement inside a component body or a generator body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Item {
    /// An instance declaration.
    Instance(InstanceDecl),
    /// A named constant declaration.
    Constant(Constant),
    /// A generator block.
    Generator(Generator),
    /// A `connect { ... }` block.
    ConnectBlock(ConnectBlock),
}

/// A statement inside a `connect { ... }` block: either a direct connection
/// or a nested generator expanding to connections.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConnectItem {
    /// A single `src -> dst;` connection.
    Connection(Connection),
    /// A generator block expanding to connections (and/or instances).
    Generator(Generator),
}

/// A single `src -> dst;` connection between two signal references.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connection {
    /// The driving signal.
    pub src: SignalRef,
    /// The driven signal.
    pub dst: SignalRef,
    /// The source span of the connection statement.
    pub span: Span,
}

/// A `connect { ... }` block: an ordered sequence of connections and
/// generators. Source ordering is syntactic only — semantics are concurrent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectBlock {
    /// The block's items, in source order.
    pub items: Vec<ConnectItem>,
    /// The source span of the block.
    pub span: Span,
}

/// A statement inside a generator body: an instance declaration, a
/// connection, or a nested generator. The grammar does not distinguish
/// declaration-scope from connect-scope generator bodies syntactically;
/// flattening validates which forms are meaningful at each nesting site.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GenBodyItem {
    /// A nested instance declaration.
    Instance(InstanceDecl),
    /// A nested connection.
    Connection(Connection),
    /// A nested generator.
    Generator(Generator),
}

/// An iteration header `> v [ranges] { body }`. Bodies may contain instance
/// declarations, connections, and nested generators.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Generator {
    /// The loop variable's name.
    pub var: String,
    /// The comma-separated list of ranges, unioned in order.
    pub ranges: Vec<RangeSpec>,
    /// The generator's body, in source order.
    pub body: Vec<GenBodyItem>,
    /// The source span of the generator.
    pub span: Span,
}

/// A component definition: ports plus a body of instances, constants,
/// generators, and a connect block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentDef {
    /// The component's name, unique within its module.
    pub name: String,
    /// The ordered input port list.
    pub inputs: Vec<Port>,
    /// The ordered output port list.
    pub outputs: Vec<Port>,
    /// The body's items, in source order.
    pub items: Vec<Item>,
    /// The source span of the whole definition.
    pub span: Span,
}

impl ComponentDef {
    /// Returns the component's single `connect` block, if it has one.
    ///
    /// The grammar permits more than one `connect` block to appear
    /// syntactically; semantic analysis treats multiple blocks as if their
    /// items were concatenated in source order.
    pub fn connect_blocks(&self) -> impl Iterator<Item = &ConnectBlock> {
        self.items.iter().filter_map(|item| match item {
            Item::ConnectBlock(cb) => Some(cb),
            _ => None,
        })
    }
}

/// A `use module::{A, B};` import statement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Import {
    /// The target module's name (without the `.shdl` extension).
    pub module: String,
    /// The subset of component names pulled in from that module.
    pub names: Vec<String>,
    /// The source span of the import statement.
    pub span: Span,
}

/// A parsed `.shdl` source file: a filename-derived module containing
/// imports and component definitions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Module {
    /// The module's name, derived from its filename.
    pub name: String,
    /// The module's imports, in source order.
    pub imports: Vec<Import>,
    /// The module's component definitions, in source order.
    pub components: Vec<ComponentDef>,
}

impl Module {
    /// Looks up a component definition by name.
    pub fn find_component(&self, name: &str) -> Option<&ComponentDef> {
        self.components.iter().find(|c| c.name == name)
    }
}

use super::expression::{Expression, ExpressionKind, FunctionNode, Identifier};
use crate::scope::ScopeId;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(Block),
    Var(VarStatement),
    Function(Box<FunctionNode>),
    Expression(Expression),
    If(IfStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    Switch(SwitchStatement),
    Try(TryStatement),
    Labeled(LabeledStatement),
    Break(JumpStatement),
    Continue(JumpStatement),
    Return(ReturnStatement),
    Throw(ThrowStatement),
    With(WithStatement),
    Debugger(Span),
    Empty(Span),
    /// `/*! ... */`, kept in the output.
    ImportantComment(CommentStatement),
    /// `/*@ ... @*/` conditional-compilation comment.
    ConditionalComment(CommentStatement),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Block(b) => b.span,
            Statement::Var(v) => v.span,
            Statement::Function(f) => f.span,
            Statement::Expression(e) => e.span,
            Statement::If(i) => i.span,
            Statement::For(f) => f.span,
            Statement::ForIn(f) => f.span,
            Statement::While(w) => w.span,
            Statement::DoWhile(d) => d.span,
            Statement::Switch(s) => s.span,
            Statement::Try(t) => t.span,
            Statement::Labeled(l) => l.span,
            Statement::Break(j) | Statement::Continue(j) => j.span,
            Statement::Return(r) => r.span,
            Statement::Throw(t) => t.span,
            Statement::With(w) => w.span,
            Statement::Debugger(s) | Statement::Empty(s) => *s,
            Statement::ImportantComment(c) | Statement::ConditionalComment(c) => c.span,
        }
    }

    pub fn empty() -> Self {
        Statement::Empty(Span::dummy())
    }

    /// Control never falls off the end of this statement.
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Statement::Return(_)
                | Statement::Break(_)
                | Statement::Continue(_)
                | Statement::Throw(_)
        )
    }

    pub fn is_empty_statement(&self) -> bool {
        match self {
            Statement::Empty(_) => true,
            Statement::Block(block) => block.statements.iter().all(|s| s.is_empty_statement()),
            _ => false,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(
            self,
            Statement::ImportantComment(_) | Statement::ConditionalComment(_)
        )
    }

    /// A string-literal expression statement, as found in a directive prologue.
    pub fn is_directive(&self) -> bool {
        matches!(self, Statement::Expression(e) if e.is_string_literal())
    }

    pub fn is_unlabeled_break(&self) -> bool {
        matches!(self, Statement::Break(j) if j.label.is_none())
    }
}

/// An ordered statement list. Function bodies, the program, braces, and
/// try/catch/finally bodies are all blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Block {
    pub fn new(statements: Vec<Statement>, span: Span) -> Self {
        Block { statements, span }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Replaces the statement at `index`. Returns false if `index` is out of
    /// range.
    pub fn replace(&mut self, index: usize, statement: Statement) -> bool {
        match self.statements.get_mut(index) {
            Some(slot) => {
                *slot = statement;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Statement> {
        if index < self.statements.len() {
            Some(self.statements.remove(index))
        } else {
            None
        }
    }

    pub fn insert(&mut self, index: usize, statement: Statement) -> bool {
        if index > self.statements.len() {
            return false;
        }
        self.statements.insert(index, statement);
        true
    }

    /// Replaces the statement at `index` with the contents of `replacement`.
    pub fn splice(&mut self, index: usize, replacement: Vec<Statement>) -> bool {
        if index >= self.statements.len() {
            return false;
        }
        self.statements.splice(index..=index, replacement);
        true
    }

    /// Index of the first statement after any directive prologue and
    /// leading important comments.
    pub fn insertion_point(&self) -> usize {
        self.statements
            .iter()
            .take_while(|s| s.is_directive() || matches!(s, Statement::ImportantComment(_)))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarStatement {
    pub declarations: Vec<VarDeclaration>,
    pub span: Span,
}

impl VarStatement {
    pub fn initializer_count(&self) -> usize {
        self.declarations
            .iter()
            .filter(|d| d.init.is_some())
            .count()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.declarations.iter().any(|d| d.name.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclaration {
    pub name: Identifier,
    pub init: Option<Expression>,
    pub span: Span,
}

impl VarDeclaration {
    /// The declaration without its initializer.
    pub fn name_only(&self) -> VarDeclaration {
        VarDeclaration {
            name: self.name.clone(),
            init: None,
            span: self.name.span,
        }
    }

    /// `name = init`, or `None` when there is no initializer.
    pub fn into_assignment(self) -> Option<Expression> {
        let VarDeclaration { name, init, span } = self;
        init.map(|init| {
            Expression::new(
                ExpressionKind::Binary(
                    super::BinaryOp::Assign,
                    Box::new(Expression::new(ExpressionKind::Identifier(name.clone()), name.span)),
                    Box::new(init),
                ),
                span,
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Var(VarStatement),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInTarget {
    Var(VarDeclaration),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForInStatement {
    pub left: ForInTarget,
    pub right: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    pub span: Span,
}

impl SwitchStatement {
    pub fn default_index(&self) -> Option<usize> {
        self.cases.iter().position(|c| c.test.is_none())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expression>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    pub block: Block,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Identifier,
    pub body: Block,
    pub scope: Option<ScopeId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStatement {
    pub label: String,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JumpStatement {
    pub label: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStatement {
    pub argument: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithStatement {
    pub object: Expression,
    pub body: Box<Statement>,
    pub scope: Option<ScopeId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentStatement {
    pub text: String,
    pub span: Span,
}

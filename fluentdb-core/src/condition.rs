use crate::{AsValue, Value};

/// Comparison operator of a condition leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereOpt {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `!=`, rendered as `<>`
    Diff,
    Greater,
    Lesser,
    GrEq,
    LeEq,
    Like,
    NotLike,
    /// Operand is a list.
    In,
    NotIn,
    /// Operand is a two element list.
    Between,
    NotBetween,
    /// `IS NULL`, operand ignored.
    Null,
    NotNull,
    /// Operand is a raw subquery.
    Exists,
    NotExists,
    EqAny,
    NotEqAny,
    DiffAny,
    GreaterAny,
    LesserAny,
    GrEqAny,
    LeEqAny,
    EqAll,
    NotEqAll,
    DiffAll,
    GreaterAll,
    LesserAll,
    GrEqAll,
    LeEqAll,
}

impl WhereOpt {
    /// The plain comparison behind an `*Any` / `*All` operator, with `true` for `ANY`.
    pub fn quantified(&self) -> Option<(WhereOpt, bool)> {
        use WhereOpt::*;
        Some(match self {
            EqAny => (Eq, true),
            NotEqAny => (NotEq, true),
            DiffAny => (Diff, true),
            GreaterAny => (Greater, true),
            LesserAny => (Lesser, true),
            GrEqAny => (GrEq, true),
            LeEqAny => (LeEq, true),
            EqAll => (Eq, false),
            NotEqAll => (NotEq, false),
            DiffAll => (Diff, false),
            GreaterAll => (Greater, false),
            LesserAll => (Lesser, false),
            GrEqAll => (GrEq, false),
            LeEqAll => (LeEq, false),
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        use WhereOpt::*;
        match self {
            Eq | EqAny | EqAll => "=",
            NotEq | Diff | NotEqAny | DiffAny | NotEqAll | DiffAll => "<>",
            Greater | GreaterAny | GreaterAll => ">",
            Lesser | LesserAny | LesserAll => "<",
            GrEq | GrEqAny | GrEqAll => ">=",
            LeEq | LeEqAny | LeEqAll => "<=",
            Like => "LIKE",
            NotLike => "NOT LIKE",
            In => "IN",
            NotIn => "NOT IN",
            Between => "BETWEEN",
            NotBetween => "NOT BETWEEN",
            Null => "IS NULL",
            NotNull => "IS NOT NULL",
            Exists => "EXISTS",
            NotExists => "NOT EXISTS",
        }
    }
}

/// Connective joining a condition to the previous one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AndOr {
    #[default]
    And,
    Or,
}

/// Right hand side of a condition.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Operand {
    #[default]
    None,
    Value(Value),
    /// Another column, `users.id`.
    Column(String),
    /// SQL text emitted verbatim, used for subqueries.
    Raw(String),
}

impl<T: AsValue> From<T> for Operand {
    fn from(value: T) -> Self {
        Operand::Value(value.as_value())
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Value(value.into())
    }
}

/// Column operand, for column to column comparisons.
pub fn col(name: impl Into<String>) -> Operand {
    Operand::Column(name.into())
}

/// Raw SQL operand, for subqueries.
pub fn raw(sql: impl Into<String>) -> Operand {
    Operand::Raw(sql.into())
}

/// A leaf comparison, or a parenthesized group when `group` is not empty.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub opt: Option<WhereOpt>,
    pub value: Operand,
    pub and_or: AndOr,
    pub group: Vec<Condition>,
}

impl Condition {
    pub fn new(field: impl Into<String>, opt: WhereOpt, value: impl Into<Operand>) -> Self {
        Self {
            field: field.into(),
            opt: Some(opt),
            value: value.into(),
            and_or: AndOr::And,
            group: Vec::new(),
        }
    }
    pub fn or(field: impl Into<String>, opt: WhereOpt, value: impl Into<Operand>) -> Self {
        Self {
            and_or: AndOr::Or,
            ..Self::new(field, opt, value)
        }
    }
    pub fn group(conditions: Vec<Condition>, and_or: AndOr) -> Self {
        Self {
            and_or,
            group: conditions,
            ..Default::default()
        }
    }
    pub fn is_group(&self) -> bool {
        !self.group.is_empty()
    }
}

/// Append-only list of conditions with the fluent WHERE methods.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WhereBuilder {
    conditions: Vec<Condition>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn r#where(
        &mut self,
        field: impl Into<String>,
        opt: WhereOpt,
        value: impl Into<Operand>,
    ) -> &mut Self {
        self.conditions.push(Condition::new(field, opt, value));
        self
    }
    pub fn where_or(
        &mut self,
        field: impl Into<String>,
        opt: WhereOpt,
        value: impl Into<Operand>,
    ) -> &mut Self {
        self.conditions.push(Condition::or(field, opt, value));
        self
    }
    /// Conditions added by `build` end up in a single parenthesized group.
    pub fn where_group(&mut self, build: impl FnOnce(&mut WhereBuilder)) -> &mut Self {
        self.push_group(AndOr::And, build)
    }
    pub fn where_or_group(&mut self, build: impl FnOnce(&mut WhereBuilder)) -> &mut Self {
        self.push_group(AndOr::Or, build)
    }
    pub fn where_condition(&mut self, conditions: impl IntoIterator<Item = Condition>) -> &mut Self {
        self.conditions.extend(conditions);
        self
    }
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
    pub fn take(&mut self) -> Vec<Condition> {
        std::mem::take(&mut self.conditions)
    }
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
    pub fn clear(&mut self) {
        self.conditions.clear();
    }
    fn push_group(&mut self, and_or: AndOr, build: impl FnOnce(&mut WhereBuilder)) -> &mut Self {
        let mut scope = WhereBuilder::new();
        build(&mut scope);
        if !scope.is_empty() {
            self.conditions.push(Condition::group(scope.take(), and_or));
        }
        self
    }
}

impl From<WhereBuilder> for Vec<Condition> {
    fn from(value: WhereBuilder) -> Self {
        value.conditions
    }
}

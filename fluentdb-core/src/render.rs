use crate::{
    AndOr, Condition, Error, JoinItem, JoinType, OrderByDir, Operand, Result, Statement, Value,
    WhereOpt, is_identifier,
};
use anyhow::bail;
use sea_query::{
    Alias, Asterisk, BinOper, Cond, Expr, MysqlQueryBuilder, Order, PostgresQueryBuilder, Query,
    QueryStatementWriter, SelectStatement, SimpleExpr,
};

/// SQL flavour of a connection, decides placeholders and how generated keys come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
}

impl Dialect {
    pub fn build<S: QueryStatementWriter>(&self, statement: &S) -> Result<Statement> {
        let (sql, values) = match self {
            Dialect::Postgres => statement.build(PostgresQueryBuilder),
            Dialect::MySql => statement.build(MysqlQueryBuilder),
        };
        let values = values
            .into_iter()
            .map(from_sea_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(Statement::new(sql, values))
    }

    /// Generated keys are read back with `RETURNING`.
    pub fn supports_returning(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Quoted form of a field for verbatim SQL fragments, `users.id` becomes `"users"."id"`.
    pub fn quote(&self, field: &str) -> String {
        if !is_identifier(field) {
            return field.to_string();
        }
        let quote = match self {
            Dialect::Postgres => '"',
            Dialect::MySql => '`',
        };
        field
            .split('.')
            .map(|part| format!("{quote}{part}{quote}"))
            .collect::<Vec<_>>()
            .join(".")
    }
}

pub fn to_sea_value(value: Value) -> Result<sea_query::Value> {
    Ok(match value {
        Value::Null => sea_query::Value::String(None),
        Value::Boolean(v) => v.into(),
        Value::Int8(v) => v.into(),
        Value::Int16(v) => v.into(),
        Value::Int32(v) => v.into(),
        Value::Int64(v) => v.into(),
        Value::UInt8(v) => v.into(),
        Value::UInt16(v) => v.into(),
        Value::UInt32(v) => v.into(),
        Value::UInt64(v) => v.into(),
        Value::Float32(v) => v.into(),
        Value::Float64(v) => v.into(),
        Value::Decimal(v) => v.into(),
        Value::Varchar(v) => v.into(),
        Value::Blob(v) => v.map(|v| v.into_vec()).into(),
        Value::Date(v) => v.into(),
        Value::Time(v) => v.into(),
        Value::Timestamp(v) => v.into(),
        Value::TimestampWithTimezone(v) => v.into(),
        Value::Uuid(v) => v.into(),
        Value::List(..) => bail!("A list can only be used with IN, BETWEEN or quantified operators"),
    })
}

pub fn from_sea_value(value: sea_query::Value) -> Result<Value> {
    use sea_query::Value as V;
    Ok(match value {
        V::Bool(v) => Value::Boolean(v),
        V::TinyInt(v) => Value::Int8(v),
        V::SmallInt(v) => Value::Int16(v),
        V::Int(v) => Value::Int32(v),
        V::BigInt(v) => Value::Int64(v),
        V::TinyUnsigned(v) => Value::UInt8(v),
        V::SmallUnsigned(v) => Value::UInt16(v),
        V::Unsigned(v) => Value::UInt32(v),
        V::BigUnsigned(v) => Value::UInt64(v),
        V::Float(v) => Value::Float32(v),
        V::Double(v) => Value::Float64(v),
        V::String(v) => Value::Varchar(v.map(|v| *v)),
        V::Char(v) => Value::Varchar(v.map(String::from)),
        V::Bytes(v) => Value::Blob(v.map(|v| v.into_boxed_slice())),
        V::TimeDate(v) => Value::Date(v.map(|v| *v)),
        V::TimeTime(v) => Value::Time(v.map(|v| *v)),
        V::TimeDateTime(v) => Value::Timestamp(v.map(|v| *v)),
        V::TimeDateTimeWithTimeZone(v) => Value::TimestampWithTimezone(v.map(|v| *v)),
        V::Uuid(v) => Value::Uuid(v.map(|v| *v)),
        V::Decimal(v) => Value::Decimal(v.map(|v| *v)),
        #[allow(unreachable_patterns)]
        v => bail!("Unexpected query argument {v:?}"),
    })
}

/// Column reference for identifiers (`name`, `users.name`), verbatim SQL for anything else.
pub fn field_expr(field: &str) -> Expr {
    if !is_identifier(field) {
        return Expr::expr(Expr::cust(field));
    }
    let parts: Vec<&str> = field.split('.').collect();
    match parts.as_slice() {
        [column] => Expr::col(Alias::new(*column)),
        [table, column] => Expr::col((Alias::new(*table), Alias::new(*column))),
        [schema, table, column] => Expr::col((
            Alias::new(*schema),
            Alias::new(*table),
            Alias::new(*column),
        )),
        _ => Expr::expr(Expr::cust(field)),
    }
}

fn bin_oper(opt: WhereOpt) -> Result<BinOper> {
    use WhereOpt::*;
    Ok(match opt {
        Eq => BinOper::Equal,
        NotEq | Diff => BinOper::NotEqual,
        Greater => BinOper::GreaterThan,
        Lesser => BinOper::SmallerThan,
        GrEq => BinOper::GreaterThanOrEqual,
        LeEq => BinOper::SmallerThanOrEqual,
        Like => BinOper::Like,
        NotLike => BinOper::NotLike,
        In => BinOper::In,
        NotIn => BinOper::NotIn,
        _ => bail!("Operator {opt:?} is not a binary comparison"),
    })
}

fn operand_expr(operand: &Operand) -> Result<SimpleExpr> {
    Ok(match operand {
        Operand::Value(v) => SimpleExpr::Value(to_sea_value(v.clone())?),
        Operand::Column(c) => field_expr(c).into(),
        Operand::Raw(sql) => Expr::cust(sql.as_str()),
        Operand::None => bail!("Missing operand"),
    })
}

fn value_items(operand: &Operand, opt: WhereOpt) -> Result<Vec<SimpleExpr>> {
    match operand {
        Operand::Value(v) => v
            .clone()
            .into_items()
            .into_iter()
            .map(|v| to_sea_value(v).map(SimpleExpr::Value))
            .collect(),
        Operand::Column(..) => Ok(vec![operand_expr(operand)?]),
        _ => bail!("Operator {opt:?} expects a list of values"),
    }
}

/// Subquery leaves are emitted whole, an operand on its own would be parenthesized as a scalar.
fn leaf_expr(dialect: Dialect, condition: &Condition) -> Result<SimpleExpr> {
    use WhereOpt::*;
    let Some(opt) = condition.opt else {
        bail!("Condition on `{}` has no operator", condition.field);
    };
    let field = || field_expr(&condition.field);
    let operand = &condition.value;
    if let Some((base, any)) = opt.quantified() {
        return Ok(match operand {
            Operand::Raw(sql) => Expr::cust(format!(
                "{} {} {} ({})",
                dialect.quote(&condition.field),
                opt.symbol(),
                if any { "ANY" } else { "ALL" },
                sql
            )),
            _ => {
                let op = bin_oper(base)?;
                let mut exprs = value_items(operand, opt)?
                    .into_iter()
                    .map(|v| field().binary(op, v));
                match exprs.next() {
                    Some(first) => exprs.fold(first, |acc, e| {
                        if any { acc.or(e) } else { acc.and(e) }
                    }),
                    None => Expr::value(!any),
                }
            }
        });
    }
    Ok(match opt {
        Null => field().is_null(),
        NotNull => field().is_not_null(),
        Exists | NotExists => match operand {
            Operand::Raw(sql) => Expr::cust(format!("{} ({})", opt.symbol(), sql)),
            _ => bail!("Operator {opt:?} expects a raw subquery"),
        },
        In | NotIn => match operand {
            Operand::Raw(sql) => Expr::cust(format!(
                "{} {} ({})",
                dialect.quote(&condition.field),
                opt.symbol(),
                sql
            )),
            _ => {
                let items = value_items(operand, opt)?;
                if opt == In {
                    field().is_in(items)
                } else {
                    field().is_not_in(items)
                }
            }
        },
        Between | NotBetween => {
            let mut items = value_items(operand, opt)?.into_iter();
            let (Some(low), Some(high), None) = (items.next(), items.next(), items.next()) else {
                bail!("Operator {opt:?} expects exactly two values");
            };
            if opt == Between {
                field().between(low, high)
            } else {
                field().not_between(low, high)
            }
        }
        _ => field().binary(bin_oper(opt)?, operand_expr(operand)?),
    })
}

/// Folds conditions left to right: AND binds tighter than OR, groups become parenthesized.
pub fn fold_conditions(dialect: Dialect, conditions: &[Condition]) -> Result<sea_query::Condition> {
    let mut any = Cond::any();
    let mut run = Cond::all();
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 && condition.and_or == AndOr::Or {
            any = any.add(run);
            run = Cond::all();
        }
        run = if condition.is_group() {
            run.add(fold_conditions(dialect, &condition.group)?)
        } else {
            run.add(leaf_expr(dialect, condition).map_err(|e| {
                e.context(format!("While rendering the condition on `{}`", condition.field))
            })?)
        };
    }
    Ok(any.add(run))
}

/// AND of every non empty source, each one kept as its own unit.
pub fn and_sources(
    dialect: Dialect,
    sources: &[&[Condition]],
) -> Result<Option<sea_query::Condition>> {
    let mut result = Cond::all();
    let mut empty = true;
    for source in sources.iter().filter(|s| !s.is_empty()) {
        result = result.add(fold_conditions(dialect, source)?);
        empty = false;
    }
    Ok(if empty { None } else { Some(result) })
}

pub fn select_from(table: &str, columns: &[String]) -> SelectStatement {
    let mut statement = Query::select();
    if columns.is_empty() {
        statement.column(Asterisk);
    }
    for column in columns {
        statement.expr(field_expr(column));
    }
    statement.from(Alias::new(table));
    statement
}

pub fn join(dialect: Dialect, statement: &mut SelectStatement, item: &JoinItem) -> Result<()> {
    let on = if item.on.field.is_empty() && !item.on.is_group() {
        Cond::all()
    } else {
        fold_conditions(dialect, std::slice::from_ref(&item.on))?
    };
    let kind = match item.join {
        JoinType::Inner => sea_query::JoinType::InnerJoin,
        JoinType::Left => sea_query::JoinType::LeftJoin,
        JoinType::Right => sea_query::JoinType::RightJoin,
        JoinType::FullOuter => sea_query::JoinType::FullOuterJoin,
        JoinType::Cross if on.is_empty() => sea_query::JoinType::CrossJoin,
        JoinType::Cross => sea_query::JoinType::InnerJoin,
    };
    let parts: Vec<&str> = item
        .table
        .split_whitespace()
        .filter(|v| !v.eq_ignore_ascii_case("as"))
        .collect();
    match parts.as_slice() {
        [table] => {
            statement.join(kind, Alias::new(*table), on);
        }
        [table, alias] => {
            statement.join_as(kind, Alias::new(*table), Alias::new(*alias), on);
        }
        _ => return Err(Error::msg(format!("Invalid join table `{}`", item.table))),
    }
    Ok(())
}

pub fn order(dir: OrderByDir) -> Order {
    match dir {
        OrderByDir::Asc => Order::Asc,
        OrderByDir::Desc => Order::Desc,
    }
}

/// `SELECT COUNT(*) AS total FROM (<select>) AS _result_out_`
pub fn count_of(select: SelectStatement) -> SelectStatement {
    let mut statement = Query::select();
    statement
        .expr_as(Expr::cust("COUNT(*)"), Alias::new("total"))
        .from_subquery(select, Alias::new("_result_out_"));
    statement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{WhereBuilder, col, raw};

    fn where_sql(dialect: Dialect, conditions: &[Condition]) -> Statement {
        let mut select = select_from("users", &[]);
        if let Some(cond) = and_sources(dialect, &[conditions]).unwrap() {
            select.cond_where(cond);
        }
        dialect.build(&select).unwrap()
    }

    #[test]
    fn group_renders_parenthesized() {
        let mut builder = WhereBuilder::new();
        builder.r#where("status", WhereOpt::Eq, "active").where_group(|g| {
            g.r#where("age", WhereOpt::Greater, 18)
                .where_or("vip", WhereOpt::Eq, true);
        });
        let statement = where_sql(Dialect::Postgres, builder.conditions());
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "users" WHERE "status" = $1 AND ("age" > $2 OR "vip" = $3)"#
        );
        assert_eq!(
            statement.values,
            vec![
                Value::Varchar(Some("active".into())),
                Value::Int32(Some(18)),
                Value::Boolean(Some(true)),
            ]
        );
    }

    #[test]
    fn or_splits_and_runs() {
        let mut builder = WhereBuilder::new();
        builder
            .r#where("a", WhereOpt::Eq, 1)
            .r#where("b", WhereOpt::Eq, 2)
            .where_or("c", WhereOpt::Eq, 3);
        let statement = where_sql(Dialect::MySql, builder.conditions());
        assert_eq!(
            statement.sql,
            "SELECT * FROM `users` WHERE (`a` = ? AND `b` = ?) OR `c` = ?"
        );
    }

    #[test]
    fn operators() {
        let mut builder = WhereBuilder::new();
        builder
            .r#where("id", WhereOpt::In, Value::list([1, 2]))
            .r#where("age", WhereOpt::Between, Value::list([18, 30]))
            .r#where("deleted_at", WhereOpt::Null, Operand::None)
            .r#where("name", WhereOpt::Like, "K%");
        let statement = where_sql(Dialect::Postgres, builder.conditions());
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "users" WHERE "id" IN ($1, $2) AND ("age" BETWEEN $3 AND $4) AND "deleted_at" IS NULL AND "name" LIKE $5"#
        );
        assert_eq!(statement.values.len(), 5);
    }

    #[test]
    fn subqueries_and_columns() {
        let mut builder = WhereBuilder::new();
        builder
            .r#where("", WhereOpt::Exists, raw("SELECT 1 FROM posts"))
            .r#where("score", WhereOpt::GreaterAll, raw("SELECT score FROM scores"))
            .r#where("users.id", WhereOpt::Eq, col("posts.user_id"));
        let statement = where_sql(Dialect::Postgres, builder.conditions());
        assert!(statement.sql.contains("EXISTS (SELECT 1 FROM posts)"));
        assert!(statement.sql.contains(r#""score" > ALL (SELECT score FROM scores)"#));
        assert!(statement.sql.contains(r#""users"."id" = "posts"."user_id""#));
        assert!(statement.values.is_empty());
    }

    #[test]
    fn subquery_operands_stay_sets() {
        let mut builder = WhereBuilder::new();
        builder
            .r#where("id", WhereOpt::EqAny, raw("SELECT user_id FROM posts"))
            .r#where("id", WhereOpt::In, raw("SELECT user_id FROM posts"))
            .r#where("users.id", WhereOpt::NotIn, raw("SELECT user_id FROM bans"));
        let statement = where_sql(Dialect::Postgres, builder.conditions());
        assert!(statement.sql.contains(r#""id" = ANY (SELECT user_id FROM posts)"#));
        assert!(statement.sql.contains(r#""id" IN (SELECT user_id FROM posts)"#));
        assert!(statement.sql.contains(r#""users"."id" NOT IN (SELECT user_id FROM bans)"#));
        assert!(!statement.sql.contains("(ANY"));
        let statement = where_sql(Dialect::MySql, builder.conditions());
        assert!(statement.sql.contains("`id` = ANY (SELECT user_id FROM posts)"));
        assert!(statement.sql.contains("`users`.`id` NOT IN (SELECT user_id FROM bans)"));
    }

    #[test]
    fn null_binds_untyped() {
        let mut builder = WhereBuilder::new();
        builder.r#where("name", WhereOpt::Eq, Value::Null);
        let statement = where_sql(Dialect::Postgres, builder.conditions());
        assert_eq!(statement.values, vec![Value::Varchar(None)]);
    }

    #[test]
    fn quantified_list_expands() {
        let mut builder = WhereBuilder::new();
        builder.r#where("age", WhereOpt::EqAny, Value::list([1, 2]));
        let statement = where_sql(Dialect::MySql, builder.conditions());
        assert_eq!(
            statement.sql,
            "SELECT * FROM `users` WHERE `age` = ? OR `age` = ?"
        );
    }

    #[test]
    fn count_wraps_select() {
        let select = select_from("users", &["id".into(), "name".into()]);
        let statement = Dialect::Postgres.build(&count_of(select)).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT COUNT(*) AS "total" FROM (SELECT "id", "name" FROM "users") AS "_result_out_""#
        );
    }

    #[test]
    fn invalid_between() {
        let mut builder = WhereBuilder::new();
        builder.r#where("age", WhereOpt::Between, 18);
        assert!(and_sources(Dialect::Postgres, &[builder.conditions()]).is_err());
    }
}

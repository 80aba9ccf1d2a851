use crate::Condition;

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    FullOuter,
    Cross,
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum OrderByDir {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinItem {
    pub join: JoinType,
    pub table: String,
    pub on: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub field: String,
    pub dir: OrderByDir,
}

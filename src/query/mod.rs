//! Semantic query AST: the strongly-typed request object the translator
//! (C4) compiles against a resolved model (C1+C3).

pub mod ast;
pub mod daterange;

pub use ast::{
    FilterItem, FilterOperator, MemberRef, Order, OrderDirection, SemanticQuery, TimeDimension,
};
pub use daterange::DateRange;

//! Core模块 - 规则编译与求值的全部核心逻辑

pub mod models;
pub mod outcome;
pub mod error;
pub mod providers;
pub mod context;
pub mod matchers;
pub mod shape;
pub mod predicate;
pub mod geo;
pub mod direction;
pub mod compiler;
pub mod engine;

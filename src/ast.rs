//! # Sieve - Abstract Syntax Tree
//!
//! This module defines the tokens and the filter-expression tree of the sieve
//! language, a small jq-like language for selecting and reshaping
//! dynamically-shaped data.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer, with source positions
//! - **[filters]** - Filter nodes (selectors, literals, compositions)
//! - **[operators]** - Binary operators
//!
//! ## Quick Start
//!
//! ```text
//! .users.name, .users | length
//! ```
//!
//! This program returns a two-element array: every user's name, and the
//! number of users.
//!
//! ## Core Concepts
//!
//! ### Selectors
//!
//! - `.` - identity
//! - `.key` - member lookup; missing keys give `null`
//! - `[n]` - element at position `n`
//! - `[a:b]` - elements `a` up to, not including, `b`
//! - `[]` / `[:]` - every element
//!
//! ### Composition
//!
//! - `f | g` - `g` consumes the output of `f`
//! - `f, g` - both see the same input; results are collected into an array
//! - `{k: f}` - builds an object from named filters
//!
//! ### Broadcast
//!
//! A key lookup applied to an array is applied to every element, so
//! `.items.price` on `{"items": [{"price": 1}, {"price": 2}]}` is `[1, 2]`.
pub mod filters;
pub mod operators;
pub mod tokens;

pub use filters::{Filter, IndexRange, Selector};
pub use operators::BinOp;
pub use tokens::{Position, Token, TokenKind};

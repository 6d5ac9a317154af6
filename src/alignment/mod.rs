pub mod backtrack;
pub mod normalization;
pub mod segments;
pub mod timing;
pub mod tokenization;
pub mod trellis;
pub mod vocabulary;

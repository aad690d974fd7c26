//! 有界 Petri 网的可达图构造与相对向上闭包禁止区域的补网计算.
#![warn(non_snake_case)]

pub mod analysis;
pub mod config;
pub mod net;
pub mod options;
pub mod report;

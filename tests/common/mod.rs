#![allow(dead_code)]

pub mod drivers;
pub mod pages;

// src/survey/mod.rs — Questionnaire scoring

pub mod knowledge;
pub mod ueq;

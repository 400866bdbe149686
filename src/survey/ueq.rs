// src/survey/ueq.rs — User Experience Questionnaire scoring
//
// 26 items answered on a 1–7 scale, mapped to −3..+3 and averaged into six
// scales. Each scale mean is graded against the public UEQ benchmark.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::auth::Condition;
use crate::infra::errors::{Result, StudyError};

pub const ITEM_COUNT: u8 = 26;

/// Scale name, item numbers, benchmark (mean, sd).
pub struct Scale {
    pub name: &'static str,
    pub items: &'static [u8],
    pub bench_mean: f64,
    pub bench_sd: f64,
}

pub const SCALES: [Scale; 6] = [
    Scale {
        name: "Attractiveness",
        items: &[1, 12, 14, 16, 24, 25],
        bench_mean: 1.50,
        bench_sd: 0.85,
    },
    Scale {
        name: "Perspicuity",
        items: &[2, 4, 13, 21],
        bench_mean: 1.45,
        bench_sd: 0.83,
    },
    Scale {
        name: "Efficiency",
        items: &[9, 20, 22, 23],
        bench_mean: 1.38,
        bench_sd: 0.79,
    },
    Scale {
        name: "Dependability",
        items: &[8, 11, 17, 19],
        bench_mean: 1.25,
        bench_sd: 0.86,
    },
    Scale {
        name: "Stimulation",
        items: &[5, 6, 7, 18],
        bench_mean: 1.17,
        bench_sd: 0.96,
    },
    Scale {
        name: "Novelty",
        items: &[3, 10, 15, 26],
        bench_mean: 0.78,
        bench_sd: 0.96,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Excellent,
    Good,
    Okay,
    Weak,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Excellent, Grade::Good, Grade::Okay, Grade::Weak];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Excellent => "excellent",
            Grade::Good => "good",
            Grade::Okay => "okay",
            Grade::Weak => "weak",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UeqEvaluation {
    pub means: BTreeMap<String, f64>,
    pub grades: BTreeMap<String, Grade>,
}

/// The JSON stored in `ueq/ueq_responses.txt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UeqRecord {
    pub answers: BTreeMap<String, u8>,
    pub scale_means: BTreeMap<String, f64>,
    pub grades: BTreeMap<String, Grade>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub condition: Option<Condition>,
}

/// 1–7 Likert to −3..+3.
pub fn to_interval(score: u8) -> i8 {
    score as i8 - 4
}

pub fn grade(mean: f64, bench_mean: f64, sd: f64) -> Grade {
    if mean >= bench_mean + 0.5 * sd {
        Grade::Excellent
    } else if mean >= bench_mean {
        Grade::Good
    } else if mean >= bench_mean - 0.5 * sd {
        Grade::Okay
    } else {
        Grade::Weak
    }
}

fn answer(answers: &BTreeMap<String, u8>, item: u8) -> Result<u8> {
    let key = format!("q{item}");
    match answers.get(&key).copied() {
        Some(v @ 1..=7) => Ok(v),
        Some(v) => Err(StudyError::InvalidAnswer {
            item: key,
            reason: format!("{v} is outside 1-7"),
        }),
        None => Err(StudyError::InvalidAnswer {
            item: key,
            reason: "missing".into(),
        }),
    }
}

/// Scale means and grades for a complete set of answers (`q1`..`q26`).
pub fn evaluate(answers: &BTreeMap<String, u8>) -> Result<UeqEvaluation> {
    let mut eval = UeqEvaluation::default();
    for scale in &SCALES {
        let mut sum = 0i32;
        for &item in scale.items {
            sum += to_interval(answer(answers, item)?) as i32;
        }
        let mean = sum as f64 / scale.items.len() as f64;
        eval.means.insert(scale.name.to_string(), mean);
        eval.grades.insert(
            scale.name.to_string(),
            grade(mean, scale.bench_mean, scale.bench_sd),
        );
    }
    Ok(eval)
}

/// Read the `answers` object of a saved UEQ file. Values may be numbers or
/// numeric strings.
fn answers_from_json(data: &Value) -> Result<BTreeMap<String, u8>> {
    let obj = data
        .get("answers")
        .and_then(Value::as_object)
        .ok_or_else(|| StudyError::InvalidAnswer {
            item: "answers".into(),
            reason: "missing answers object".into(),
        })?;

    obj.iter()
        .map(|(k, v)| {
            let n = v
                .as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| StudyError::InvalidAnswer {
                    item: k.clone(),
                    reason: format!("not a number: {v}"),
                })?;
            Ok((k.clone(), n))
        })
        .collect()
}

/// Recompute scale means and grades of a saved UEQ JSON file and write the
/// result next to it as `<stem>_fixed.txt`. Answers are normalized to
/// numbers; other fields are preserved.
pub fn recalc_file(path: &Path) -> Result<PathBuf> {
    let mut data: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let answers = answers_from_json(&data)?;
    let eval = evaluate(&answers)?;

    if let Value::Object(obj) = &mut data {
        obj.insert("answers".into(), serde_json::to_value(&answers)?);
        obj.insert("scale_means".into(), serde_json::to_value(&eval.means)?);
        obj.insert("grades".into(), serde_json::to_value(&eval.grades)?);
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("ueq_responses");
    let out = path.with_file_name(format!("{stem}_fixed.txt"));
    std::fs::write(&out, serde_json::to_string_pretty(&data)?)?;
    tracing::info!(from = %path.display(), to = %out.display(), "Recalculated UEQ scores");
    Ok(out)
}

//! Model persistence in the libsvm text format
//!
//! A model file is a block of `keyword values...` header lines terminated by a line
//! reading `SV`, followed by one line per support vector: its `nr_class - 1`
//! coefficients, then `index:value` pairs (`0:<row id>` for precomputed kernels).
//!
//! Floats are written with Rust's shortest round-trip formatting, so a saved model
//! reloads bit for bit. [`model_summary`] gives a JSON view for tooling.

use crate::core::{KernelType, Parameters, Result, SVMError, SVMType, SparseVector};
use crate::kernel::row_id;
use crate::model::Model;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Format a float so that it parses back to the same value
fn format_float(v: f64) -> String {
    let magnitude = v.abs();
    if v == 0.0 || (1e-4..1e15).contains(&magnitude) {
        format!("{v}")
    } else {
        format!("{v:e}")
    }
}

fn write_floats<W: Write>(w: &mut W, keyword: &str, values: &[f64]) -> Result<()> {
    write!(w, "{keyword}")?;
    for &v in values {
        write!(w, " {}", format_float(v))?;
    }
    writeln!(w)?;
    Ok(())
}

/// Write `model` in text form
pub fn write_model<W: Write>(w: &mut W, model: &Model) -> Result<()> {
    let params = &model.params;

    writeln!(w, "svm_type {}", params.svm_type)?;
    writeln!(w, "kernel_type {}", params.kernel_type)?;
    if params.kernel_type == KernelType::Polynomial {
        writeln!(w, "degree {}", params.degree)?;
    }
    if params.kernel_type.uses_gamma() {
        writeln!(w, "gamma {}", format_float(params.gamma))?;
    }
    if params.kernel_type.uses_coef0() {
        writeln!(w, "coef0 {}", format_float(params.coef0))?;
    }

    writeln!(w, "nr_class {}", model.nr_class)?;
    writeln!(w, "total_sv {}", model.sv.len())?;
    write_floats(w, "rho", &model.rho)?;

    if !model.label.is_empty() {
        write!(w, "label")?;
        for label in &model.label {
            write!(w, " {label}")?;
        }
        writeln!(w)?;
    }
    if !model.prob_a.is_empty() {
        write_floats(w, "probA", &model.prob_a)?;
    }
    if !model.prob_b.is_empty() {
        write_floats(w, "probB", &model.prob_b)?;
    }
    if !model.n_sv.is_empty() {
        write!(w, "nr_sv")?;
        for n in &model.n_sv {
            write!(w, " {n}")?;
        }
        writeln!(w)?;
    }

    writeln!(w, "SV")?;
    for (i, sv) in model.sv.iter().enumerate() {
        for row in &model.sv_coef {
            write!(w, "{} ", format_float(row[i]))?;
        }
        if params.kernel_type == KernelType::Precomputed {
            write!(w, "0:{}", row_id(sv) as i64)?;
        } else {
            for (index, value) in sv.indices.iter().zip(&sv.values) {
                write!(w, "{index}:{} ", format_float(*value))?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Save `model` to `path`
pub fn save_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_model(&mut writer, model)?;
    writer.flush()?;
    Ok(())
}

fn format_error(line: usize, message: impl std::fmt::Display) -> SVMError {
    SVMError::ModelFormat(format!("line {line}: {message}"))
}

fn parse_value<T: std::str::FromStr>(token: &str, line: usize, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| format_error(line, format!("invalid {what}: {token}")))
}

fn parse_one<'a, T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line: usize,
    keyword: &str,
) -> Result<T> {
    let token = tokens
        .next()
        .ok_or_else(|| format_error(line, format!("missing {keyword} value")))?;
    parse_value(token, line, keyword)
}

fn parse_all<'a, T: std::str::FromStr>(
    tokens: impl Iterator<Item = &'a str>,
    line: usize,
    keyword: &str,
) -> Result<Vec<T>> {
    tokens.map(|t| parse_value(t, line, keyword)).collect()
}

/// Header fields, each `None` until its keyword is seen
#[derive(Default)]
struct Header {
    svm_type: Option<SVMType>,
    kernel_type: Option<KernelType>,
    degree: Option<i32>,
    gamma: Option<f64>,
    coef0: Option<f64>,
    nr_class: Option<usize>,
    total_sv: Option<usize>,
    rho: Option<Vec<f64>>,
    label: Option<Vec<i32>>,
    prob_a: Option<Vec<f64>>,
    prob_b: Option<Vec<f64>>,
    n_sv: Option<Vec<usize>>,
}

fn required<T>(field: Option<T>, keyword: &str) -> Result<T> {
    field.ok_or_else(|| SVMError::ModelFormat(format!("missing {keyword}")))
}

fn check_len<T>(values: &[T], expected: usize, keyword: &str) -> Result<()> {
    if values.len() != expected {
        return Err(SVMError::ModelFormat(format!(
            "{keyword} has {} values, expected {expected}",
            values.len()
        )));
    }
    Ok(())
}

/// Read a model in text form
///
/// Unknown keywords, missing required fields, inconsistent counts and malformed
/// support-vector lines are rejected.
pub fn read_model<R: BufRead>(reader: R) -> Result<Model> {
    let mut lines = reader.lines().enumerate();
    let mut header = Header::default();

    loop {
        let (idx, line) = lines
            .next()
            .ok_or_else(|| SVMError::ModelFormat("unexpected end of file in header".into()))?;
        let line = line?;
        let line_num = idx + 1;

        let mut tokens = line.split_whitespace();
        let keyword = match tokens.next() {
            Some(keyword) => keyword,
            None => continue,
        };

        match keyword {
            "svm_type" => {
                let name: String = parse_one(&mut tokens, line_num, keyword)?;
                header.svm_type = Some(name.parse().map_err(|_| {
                    format_error(line_num, format!("unknown svm type: {name}"))
                })?);
            }
            "kernel_type" => {
                let name: String = parse_one(&mut tokens, line_num, keyword)?;
                header.kernel_type = Some(name.parse().map_err(|_| {
                    format_error(line_num, format!("unknown kernel type: {name}"))
                })?);
            }
            "degree" => header.degree = Some(parse_one(&mut tokens, line_num, keyword)?),
            "gamma" => header.gamma = Some(parse_one(&mut tokens, line_num, keyword)?),
            "coef0" => header.coef0 = Some(parse_one(&mut tokens, line_num, keyword)?),
            "nr_class" => header.nr_class = Some(parse_one(&mut tokens, line_num, keyword)?),
            "total_sv" => header.total_sv = Some(parse_one(&mut tokens, line_num, keyword)?),
            "rho" => header.rho = Some(parse_all(tokens, line_num, keyword)?),
            "label" => header.label = Some(parse_all(tokens, line_num, keyword)?),
            "probA" => header.prob_a = Some(parse_all(tokens, line_num, keyword)?),
            "probB" => header.prob_b = Some(parse_all(tokens, line_num, keyword)?),
            "nr_sv" => header.n_sv = Some(parse_all(tokens, line_num, keyword)?),
            "SV" => break,
            other => return Err(format_error(line_num, format!("unknown keyword: {other}"))),
        }
    }

    let svm_type = required(header.svm_type, "svm_type")?;
    let kernel_type = required(header.kernel_type, "kernel_type")?;
    let nr_class = required(header.nr_class, "nr_class")?;
    let total_sv = required(header.total_sv, "total_sv")?;
    let rho = required(header.rho, "rho")?;

    if svm_type.is_classification() && nr_class < 1 {
        return Err(SVMError::ModelFormat(format!(
            "{svm_type} model must have at least one class"
        )));
    }

    let pairs = nr_class * nr_class.saturating_sub(1) / 2;
    check_len(&rho, pairs, "rho")?;

    let prob_a = header.prob_a.unwrap_or_default();
    let prob_b = header.prob_b.unwrap_or_default();
    let prob_len = if svm_type.is_classification() { pairs } else { 1 };
    if !prob_a.is_empty() {
        check_len(&prob_a, prob_len, "probA")?;
    }
    if !prob_b.is_empty() {
        check_len(&prob_b, prob_len, "probB")?;
    }

    let (label, n_sv) = if svm_type.is_classification() {
        let label = required(header.label, "label")?;
        let n_sv = required(header.n_sv, "nr_sv")?;
        check_len(&label, nr_class, "label")?;
        check_len(&n_sv, nr_class, "nr_sv")?;
        if n_sv.iter().sum::<usize>() != total_sv {
            return Err(SVMError::ModelFormat(
                "nr_sv does not add up to total_sv".into(),
            ));
        }
        (label, n_sv)
    } else {
        if nr_class != 2 {
            return Err(SVMError::ModelFormat(format!(
                "{svm_type} model must have nr_class 2"
            )));
        }
        (Vec::new(), Vec::new())
    };

    let defaults = Parameters::default();
    let degree = if kernel_type == KernelType::Polynomial {
        required(header.degree, "degree")?
    } else {
        header.degree.unwrap_or(defaults.degree)
    };
    let gamma = if kernel_type.uses_gamma() {
        required(header.gamma, "gamma")?
    } else {
        header.gamma.unwrap_or(defaults.gamma)
    };
    let coef0 = if kernel_type.uses_coef0() {
        required(header.coef0, "coef0")?
    } else {
        header.coef0.unwrap_or(defaults.coef0)
    };
    let params = Parameters {
        svm_type,
        kernel_type,
        degree,
        gamma,
        coef0,
        ..defaults
    };

    let m = nr_class.saturating_sub(1);
    let mut sv_coef: Vec<Vec<f64>> = vec![Vec::with_capacity(total_sv); m];
    let mut sv = Vec::with_capacity(total_sv);

    while sv.len() < total_sv {
        let (idx, line) = lines.next().ok_or_else(|| {
            SVMError::ModelFormat(format!(
                "expected {total_sv} support vectors, found {}",
                sv.len()
            ))
        })?;
        let line = line?;
        let line_num = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        for row in sv_coef.iter_mut() {
            row.push(parse_one(&mut tokens, line_num, "coefficient")?);
        }

        let mut indices = Vec::new();
        let mut values = Vec::new();
        for token in tokens {
            let (index, value) = token
                .split_once(':')
                .ok_or_else(|| format_error(line_num, format!("expected index:value, got {token}")))?;
            let index: usize = parse_value(index, line_num, "index")?;
            let value: f64 = parse_value(value, line_num, "value")?;
            if indices.last().is_some_and(|&prev| index <= prev) {
                return Err(format_error(line_num, "feature indices must be ascending"));
            }
            indices.push(index);
            values.push(value);
        }
        sv.push(SparseVector { indices, values });
    }

    for (idx, line) in lines {
        if !line?.trim().is_empty() {
            return Err(format_error(idx + 1, "unexpected content after support vectors"));
        }
    }

    Ok(Model {
        params,
        nr_class,
        sv,
        sv_coef,
        rho,
        prob_a,
        prob_b,
        sv_indices: Vec::new(),
        label,
        n_sv,
    })
}

/// Load a model from `path`
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Model> {
    let file = File::open(path)?;
    read_model(BufReader::new(file))
}

/// Summary of a model for display and tooling
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub library_version: String,
    pub svm_type: SVMType,
    pub kernel_type: KernelType,
    pub nr_class: usize,
    pub total_sv: usize,
    pub labels: Vec<i32>,
    pub n_sv: Vec<usize>,
    pub rho: Vec<f64>,
    pub probability: bool,
}

impl ModelSummary {
    pub fn from_model(model: &Model) -> Self {
        Self {
            library_version: crate::VERSION.to_string(),
            svm_type: model.svm_type(),
            kernel_type: model.params.kernel_type,
            nr_class: model.nr_class,
            total_sv: model.support_vector_count(),
            labels: model.label.clone(),
            n_sv: model.n_sv.clone(),
            rho: model.rho.clone(),
            probability: model.has_probability_model(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SVMError::ModelFormat(format!("cannot encode summary: {e}")))
    }

    /// Print a human readable summary
    pub fn print(&self) {
        println!("=== SVM Model Summary ===");
        println!("SVM Type: {}", self.svm_type);
        println!("Kernel Type: {}", self.kernel_type);
        println!("Classes: {}", self.nr_class);
        println!("Support Vectors: {}", self.total_sv);
        if !self.labels.is_empty() {
            println!("Labels: {:?}", self.labels);
            println!("Support Vectors per Class: {:?}", self.n_sv);
        }
        println!("Probability Model: {}", self.probability);
        println!("Library Version: {}", self.library_version);
    }
}

/// Summarize a model
pub fn model_summary(model: &Model) -> ModelSummary {
    ModelSummary::from_model(model)
}

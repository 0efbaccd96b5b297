use crate::domain::model::{
    FieldErrors, FieldKind, FormSpec, SubmittedData, ValidationResult, ValidatorSpec,
};
use crate::utils::error::{AppError, Result};
use regex::Regex;
use std::collections::HashSet;

pub const MSG_STRING_EMPTY: &str = "The input is an empty string";
pub const MSG_NOT_ALPHA: &str = "The input contains non alphabetic characters";
pub const MSG_IS_EMPTY: &str = "Value is required and can't be empty";

#[derive(Debug, Clone)]
enum CompiledValidator {
    Alpha(Regex),
    NotEmpty,
    StringLength { min: usize, max: Option<usize> },
    Pattern { regex: Regex, pattern: String },
}

impl CompiledValidator {
    fn compile(field: &str, spec: &ValidatorSpec) -> Result<Self> {
        match spec {
            ValidatorSpec::Alpha { allow_white_space } => {
                let pattern = if *allow_white_space {
                    r"^[A-Za-z ]+$"
                } else {
                    r"^[A-Za-z]+$"
                };
                Ok(Self::Alpha(compile_pattern(field, pattern)?))
            }
            ValidatorSpec::NotEmpty => Ok(Self::NotEmpty),
            ValidatorSpec::StringLength { min, max } => {
                if let Some(max) = max {
                    if min > max {
                        return Err(AppError::InvalidConfigValueError {
                            field: format!("form.elements.{}.validators", field),
                            value: format!("min={}, max={}", min, max),
                            reason: "min cannot exceed max".to_string(),
                        });
                    }
                }
                Ok(Self::StringLength {
                    min: *min,
                    max: *max,
                })
            }
            ValidatorSpec::Regex { pattern } => Ok(Self::Pattern {
                regex: compile_pattern(field, pattern)?,
                pattern: pattern.clone(),
            }),
        }
    }

    fn check(&self, value: &str) -> Option<String> {
        match self {
            Self::Alpha(regex) => {
                if value.is_empty() {
                    Some(MSG_STRING_EMPTY.to_string())
                } else if !regex.is_match(value) {
                    Some(MSG_NOT_ALPHA.to_string())
                } else {
                    None
                }
            }
            Self::NotEmpty => value
                .trim()
                .is_empty()
                .then(|| MSG_IS_EMPTY.to_string()),
            Self::StringLength { min, max } => {
                let length = value.chars().count();
                if length < *min {
                    Some(format!("The input is less than {} characters long", min))
                } else if max.is_some_and(|max| length > max) {
                    Some(format!(
                        "The input is more than {} characters long",
                        max.unwrap_or_default()
                    ))
                } else {
                    None
                }
            }
            Self::Pattern { regex, pattern } => (!regex.is_match(value))
                .then(|| format!("The input does not match against pattern '{}'", pattern)),
        }
    }
}

fn compile_pattern(field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AppError::InvalidConfigValueError {
        field: format!("form.elements.{}.validators", field),
        value: pattern.to_string(),
        reason: format!("Invalid regex: {}", e),
    })
}

/// A form definition with its validators compiled, bound to a submission path.
#[derive(Debug, Clone)]
pub struct Form {
    spec: FormSpec,
    action: String,
    validators: Vec<(String, Vec<CompiledValidator>)>,
}

impl Form {
    pub fn new(spec: FormSpec, action: impl Into<String>) -> Result<Self> {
        validate_definition(&spec)?;

        let mut validators = Vec::new();
        for field in spec.input_fields() {
            let compiled = field
                .validators
                .iter()
                .map(|v| CompiledValidator::compile(&field.name, v))
                .collect::<Result<Vec<_>>>()?;
            validators.push((field.name.clone(), compiled));
        }

        Ok(Self {
            spec,
            action: action.into(),
            validators,
        })
    }

    pub fn spec(&self) -> &FormSpec {
        &self.spec
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn identity_field(&self) -> &str {
        &self.spec.identity_field
    }

    /// 缺少的欄位以空字串驗證；每個驗證器的錯誤訊息都會收集
    pub fn validate(&self, data: &SubmittedData) -> ValidationResult {
        let mut errors = FieldErrors::new();

        for (name, validators) in &self.validators {
            let value = data.get(name).unwrap_or("");
            let messages: Vec<String> = validators.iter().filter_map(|v| v.check(value)).collect();
            if !messages.is_empty() {
                errors.insert(name.clone(), messages);
            }
        }

        ValidationResult { errors }
    }

    /// Values of the declared input fields, verbatim. Buttons and unknown keys are dropped.
    pub fn extract_values(&self, data: &SubmittedData) -> SubmittedData {
        self.spec
            .input_fields()
            .filter_map(|field| {
                data.get(&field.name)
                    .map(|value| (field.name.clone(), value.to_string()))
            })
            .collect()
    }
}

pub fn validate_definition(spec: &FormSpec) -> Result<()> {
    crate::utils::validation::validate_non_empty_string("form.name", &spec.name)?;

    let mut seen = HashSet::new();
    for field in &spec.elements {
        crate::utils::validation::validate_non_empty_string("form.elements.name", &field.name)?;
        if !seen.insert(field.name.as_str()) {
            return Err(AppError::ConfigValidationError {
                field: "form.elements".to_string(),
                message: format!("Duplicate field name '{}'", field.name),
            });
        }
    }

    match spec.field(&spec.identity_field) {
        Some(field) if field.kind == FieldKind::Text => Ok(()),
        Some(_) => Err(AppError::ConfigValidationError {
            field: "form.identity_field".to_string(),
            message: format!("Field '{}' must be a text field", spec.identity_field),
        }),
        None => Err(AppError::ConfigValidationError {
            field: "form.identity_field".to_string(),
            message: format!("Field '{}' is not declared", spec.identity_field),
        }),
    }
}

use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 欄位名稱 -> 錯誤訊息列表（僅包含驗證失敗的欄位）
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Password,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidatorSpec {
    /// ASCII letters only; spaces are accepted when `allow_white_space` is set.
    Alpha {
        #[serde(default)]
        allow_white_space: bool,
    },
    NotEmpty,
    StringLength {
        #[serde(default)]
        min: usize,
        max: Option<usize>,
    },
    Regex {
        pattern: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub name: String,
    pub label: Option<String>,
    pub size: Option<u32>,
    /// Button text for submit fields.
    pub value: Option<String>,
    #[serde(default)]
    pub validators: Vec<ValidatorSpec>,
}

impl FieldSpec {
    pub fn text(name: &str) -> Self {
        Self::new(FieldKind::Text, name)
    }

    pub fn password(name: &str) -> Self {
        Self::new(FieldKind::Password, name)
    }

    pub fn submit(name: &str, value: &str) -> Self {
        let mut field = Self::new(FieldKind::Submit, name);
        field.value = Some(value.to_string());
        field
    }

    fn new(kind: FieldKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            label: None,
            size: None,
            value: None,
            validators: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_validator(mut self, validator: ValidatorSpec) -> Self {
        self.validators.push(validator);
        self
    }

    /// Submit buttons carry no user data.
    pub fn is_input(&self) -> bool {
        self.kind != FieldKind::Submit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSpec {
    pub name: String,
    #[serde(default = "default_identity_field")]
    pub identity_field: String,
    pub elements: Vec<FieldSpec>,
}

fn default_identity_field() -> String {
    "log".to_string()
}

impl FormSpec {
    /// 登入表單：帳號（僅限字母）、密碼、兩個送出按鈕
    pub fn authentication() -> Self {
        Self {
            name: "authentification".to_string(),
            identity_field: default_identity_field(),
            elements: vec![
                FieldSpec::text("log")
                    .with_label("Login: ")
                    .with_size(20)
                    .with_validator(ValidatorSpec::Alpha {
                        allow_white_space: false,
                    }),
                FieldSpec::password("mdp")
                    .with_label("Mot de passe: ")
                    .with_size(20),
                FieldSpec::submit("submit", "Suite"),
                FieldSpec::submit("Inscription", "Inscrit toi"),
            ],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.elements.iter().find(|field| field.name == name)
    }

    pub fn input_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.elements.iter().filter(|field| field.is_input())
    }
}

/// Raw field values of one request, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmittedData(BTreeMap<String, String>);

impl SubmittedData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SubmittedData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub errors: FieldErrors,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages_for(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub action: String,
    pub values: SubmittedData,
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Welcome {
    pub login: String,
    pub values: SubmittedData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDecision {
    RenderForm(FormState),
    RenderSuccess(Welcome),
}

/// Template name plus the variables bound to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewModel {
    template: Option<String>,
    variables: Map<String, Value>,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }

    pub fn with_variable(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    /// 以可序列化的結構設定變數；非物件會包在 `value` 底下
    pub fn with_variables<T: Serialize>(mut self, variables: &T) -> Result<Self> {
        match serde_json::to_value(variables)? {
            Value::Object(map) => self.variables.extend(map),
            other => {
                self.variables.insert("value".to_string(), other);
            }
        }
        Ok(self)
    }

    pub fn set_template(&mut self, template: &str) {
        self.template = Some(template.to_string());
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

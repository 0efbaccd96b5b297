use crate::core::form::Form;
use crate::domain::model::{FieldErrors, FieldKind, FormState, RenderDecision, ViewModel, Welcome};
use crate::utils::error::Result;
use serde::Serialize;

pub const TEMPLATE_INDEX: &str = "index";
pub const TEMPLATE_FORM: &str = "auth/form";
pub const TEMPLATE_WELCOME: &str = "auth/welcome";

#[derive(Debug, Serialize)]
struct FieldView<'a> {
    kind: FieldKind,
    name: &'a str,
    label: Option<&'a str>,
    size: Option<u32>,
    value: Option<&'a str>,
    errors: &'a [String],
}

#[derive(Debug, Serialize)]
struct FormView<'a> {
    name: &'a str,
    action: &'a str,
    fields: Vec<FieldView<'a>>,
}

#[derive(Debug, Serialize)]
struct FormPage<'a> {
    form: FormView<'a>,
    errors: &'a FieldErrors,
}

pub fn index_view(form: &Form) -> ViewModel {
    ViewModel::new()
        .with_template(TEMPLATE_INDEX)
        .with_variable("nom", "tintin")
        .with_variable("form_url", form.action())
}

pub fn decision_view(form: &Form, decision: &RenderDecision) -> Result<ViewModel> {
    match decision {
        RenderDecision::RenderForm(state) => form_view(form, state),
        RenderDecision::RenderSuccess(welcome) => Ok(welcome_view(welcome)),
    }
}

/// 密碼欄位永遠不回填
fn form_view(form: &Form, state: &FormState) -> Result<ViewModel> {
    let fields = form
        .spec()
        .elements
        .iter()
        .map(|field| {
            let value = match field.kind {
                FieldKind::Text => state.values.get(&field.name),
                FieldKind::Password => None,
                FieldKind::Submit => field.value.as_deref(),
            };
            FieldView {
                kind: field.kind,
                name: &field.name,
                label: field.label.as_deref(),
                size: field.size,
                value,
                errors: state
                    .errors
                    .get(&field.name)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]),
            }
        })
        .collect();

    let page = FormPage {
        form: FormView {
            name: &form.spec().name,
            action: &state.action,
            fields,
        },
        errors: &state.errors,
    };

    ViewModel::new().with_template(TEMPLATE_FORM).with_variables(&page)
}

fn welcome_view(welcome: &Welcome) -> ViewModel {
    ViewModel::new()
        .with_template(TEMPLATE_WELCOME)
        .with_variable("login", welcome.login.as_str())
}

use crate::core::form::Form;
use crate::domain::model::{
    FieldErrors, FormState, RenderDecision, RequestMethod, SubmittedData, Welcome,
};

/// Decides what to render for one request against the authentication form.
///
/// GET always yields an empty form. POST validates the submitted data: a
/// valid submission yields the welcome decision built from the validated
/// values, an invalid one re-renders the form with the submitted values and
/// the per-field messages. A POST without a body is validated as empty.
pub fn handle(
    method: RequestMethod,
    form: &Form,
    submitted: Option<&SubmittedData>,
) -> RenderDecision {
    match method {
        RequestMethod::Get => RenderDecision::RenderForm(FormState {
            action: form.action().to_string(),
            values: SubmittedData::new(),
            errors: FieldErrors::new(),
        }),
        RequestMethod::Post => {
            let empty = SubmittedData::new();
            let data = submitted.unwrap_or(&empty);

            let result = form.validate(data);
            let values = form.extract_values(data);

            if result.is_valid() {
                let login = values
                    .get(form.identity_field())
                    .unwrap_or_default()
                    .to_string();
                tracing::debug!("Form '{}' accepted for login '{}'", form.spec().name, login);
                RenderDecision::RenderSuccess(Welcome { login, values })
            } else {
                tracing::debug!(
                    "Form '{}' rejected: {} invalid field(s)",
                    form.spec().name,
                    result.errors.len()
                );
                RenderDecision::RenderForm(FormState {
                    action: form.action().to_string(),
                    values,
                    errors: result.errors,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::form::MSG_NOT_ALPHA;
    use crate::domain::model::FormSpec;

    fn auth_form() -> Form {
        Form::new(FormSpec::authentication(), "/form").unwrap()
    }

    fn data(pairs: &[(&str, &str)]) -> SubmittedData {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_get_renders_empty_form() {
        let decision = handle(RequestMethod::Get, &auth_form(), None);
        assert_eq!(
            decision,
            RenderDecision::RenderForm(FormState {
                action: "/form".to_string(),
                values: SubmittedData::new(),
                errors: FieldErrors::new(),
            })
        );
    }

    #[test]
    fn test_get_ignores_submitted_data() {
        let submitted = data(&[("log", "tintin")]);
        match handle(RequestMethod::Get, &auth_form(), Some(&submitted)) {
            RenderDecision::RenderForm(state) => {
                assert!(state.values.is_empty());
                assert!(state.errors.is_empty());
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_valid_post_renders_success() {
        let submitted = data(&[("log", "tintin"), ("mdp", "secret"), ("submit", "Suite")]);
        match handle(RequestMethod::Post, &auth_form(), Some(&submitted)) {
            RenderDecision::RenderSuccess(welcome) => {
                assert_eq!(welcome.login, "tintin");
                assert_eq!(welcome.values, data(&[("log", "tintin"), ("mdp", "secret")]));
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_post_re_renders_with_errors() {
        let submitted = data(&[("log", "tintin1"), ("mdp", "secret")]);
        match handle(RequestMethod::Post, &auth_form(), Some(&submitted)) {
            RenderDecision::RenderForm(state) => {
                assert_eq!(state.values.get("log"), Some("tintin1"));
                assert_eq!(state.values.get("mdp"), Some("secret"));
                assert_eq!(state.errors.get("log"), Some(&vec![MSG_NOT_ALPHA.to_string()]));
                assert!(!state.errors.contains_key("mdp"));
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_post_without_body_is_invalid() {
        match handle(RequestMethod::Post, &auth_form(), None) {
            RenderDecision::RenderForm(state) => {
                assert!(state.values.is_empty());
                assert!(state.errors.contains_key("log"));
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_valid_post_is_idempotent() {
        let form = auth_form();
        let submitted = data(&[("log", "Milou"), ("mdp", "os")]);
        let first = handle(RequestMethod::Post, &form, Some(&submitted));
        let second = handle(RequestMethod::Post, &form, Some(&submitted));
        assert_eq!(first, second);
    }

    #[test]
    fn test_alphabetic_logins_always_succeed() {
        let form = auth_form();
        for login in ["a", "Z", "tintin", "HaddockCapitaine", "abcdefghijklmnopqrstuvwxyz"] {
            let submitted = data(&[("log", login), ("mdp", "x")]);
            match handle(RequestMethod::Post, &form, Some(&submitted)) {
                RenderDecision::RenderSuccess(welcome) => assert_eq!(welcome.login, login),
                other => panic!("'{}' should be accepted: {:?}", login, other),
            }
        }
    }

    #[test]
    fn test_non_alphabetic_logins_always_fail() {
        let form = auth_form();
        for login in ["tintin1", "tin tin", "tin-tin", "été", "_", "tintin!"] {
            let submitted = data(&[("log", login), ("mdp", "x")]);
            match handle(RequestMethod::Post, &form, Some(&submitted)) {
                RenderDecision::RenderForm(state) => {
                    assert_eq!(state.values.get("log"), Some(login));
                    assert!(!state.errors["log"].is_empty());
                }
                other => panic!("'{}' should be rejected: {:?}", login, other),
            }
        }
    }
}

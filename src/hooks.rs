use std::rc::Rc;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// State and callbacks of a text field whose content parses into `T`.
#[derive(Clone)]
pub struct ValidatedField<T: Clone + PartialEq + 'static> {
    /// What the user typed.
    pub text: String,
    /// Last successfully parsed value, if any.
    pub value: Option<T>,
    pub error: Option<String>,
    /// `oninput` handler; only updates the text.
    pub on_input: Callback<InputEvent>,
    /// Parse the current text. Wire to `onchange` or the form submit.
    pub on_commit: Callback<()>,
    /// Put the field back to its initial text and value, dropping any error.
    pub clear: Callback<()>,
    /// Replace the text programmatically; it is parsed on the next commit.
    pub set_text: Callback<String>,
}

/// Keep a text input and its parsed value in sync.
///
/// Parsing happens on commit rather than on every keystroke, so the error
/// message does not flicker while the user is still typing.
#[hook]
pub fn use_validated_field<T: Clone + PartialEq + 'static>(
    initial_text: &str,
    parse: Rc<dyn Fn(&str) -> Result<T, String>>,
) -> ValidatedField<T> {
    let initial_text = initial_text.to_string();
    let initial_value = parse(initial_text.as_str()).ok();
    let text = use_state(|| initial_text.clone());
    let value = use_state(|| initial_value.clone());
    let error = use_state(|| None::<String>);

    let on_input = {
        let text = text.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            text.set(input.value());
        })
    };

    let on_commit = {
        let text = text.clone();
        let value = value.clone();
        let error = error.clone();
        Callback::from(move |_| match parse(text.as_str()) {
            Ok(parsed) => {
                value.set(Some(parsed));
                error.set(None);
            }
            Err(message) => {
                value.set(None);
                error.set(Some(message));
            }
        })
    };

    let clear = {
        let text = text.clone();
        let value = value.clone();
        let error = error.clone();
        Callback::from(move |_| {
            text.set(initial_text.clone());
            value.set(initial_value.clone());
            error.set(None);
        })
    };

    let set_text = {
        let text = text.clone();
        let error = error.clone();
        Callback::from(move |new_text: String| {
            text.set(new_text);
            error.set(None);
        })
    };

    ValidatedField {
        text: (*text).clone(),
        value: (*value).clone(),
        error: (*error).clone(),
        on_input,
        on_commit,
        clear,
        set_text,
    }
}

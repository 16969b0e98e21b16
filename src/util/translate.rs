//! Field-error translation for inline form messages.
//!
//! The server rejects a form with `{"errors": {"field": ["code", ...]}}`.
//! Translation maps both the field name and each code through a catalog;
//! anything the catalog does not know is passed through unchanged.

#[cfg(test)]
#[path = "translate_test.rs"]
mod translate_test;

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

/// `field -> [code or message]`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub trait FieldErrorTranslator {
    fn translate(&self, errors: &FieldErrors) -> FieldErrors;
}

/// Lookup-table translator.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<&'static str, &'static str>,
    fields: HashMap<&'static str, &'static str>,
}

impl Catalog {
    #[must_use]
    pub fn new(
        messages: impl IntoIterator<Item = (&'static str, &'static str)>,
        fields: impl IntoIterator<Item = (&'static str, &'static str)>,
    ) -> Self {
        Self { messages: messages.into_iter().collect(), fields: fields.into_iter().collect() }
    }

    /// The user-management screen's Brazilian Portuguese catalog.
    #[must_use]
    pub fn portuguese() -> Self {
        Self::new(
            [
                ("validation.required", "Campo obrigatório"),
                ("validation.in", "Tipo deve ser Admin ou Comum"),
                ("validation.email", "E-mail inválido"),
                ("validation.minLength", "Mínimo de {min} caracteres"),
                ("validation.maxLength", "Máximo de {max} caracteres"),
                ("validation.unique", "Já existe um usuário com este e-mail"),
            ],
            [("name", "Nome"), ("email", "E-mail"), ("role", "Tipo"), ("password", "Senha")],
        )
    }
}

impl FieldErrorTranslator for Catalog {
    fn translate(&self, errors: &FieldErrors) -> FieldErrors {
        let mut translated = FieldErrors::new();
        for (field, codes) in errors {
            let label = self.fields.get(field.as_str()).map_or_else(|| field.clone(), |l| (*l).to_owned());
            let messages = codes
                .iter()
                .map(|code| self.messages.get(code.as_str()).map_or_else(|| code.clone(), |m| (*m).to_owned()));
            translated.entry(label).or_default().extend(messages);
        }
        translated
    }
}

/// Pull the `errors` object out of a rejected response body.
///
/// A field mapped to a single string is read as a one-element list;
/// non-string entries are skipped.
#[must_use]
pub fn field_errors_from_payload(payload: &Value) -> FieldErrors {
    let Some(errors) = payload.get("errors").and_then(Value::as_object) else {
        return FieldErrors::new();
    };
    errors
        .iter()
        .filter_map(|(field, codes)| {
            let codes: Vec<String> = match codes {
                Value::String(code) => vec![code.clone()],
                Value::Array(items) => items.iter().filter_map(Value::as_str).map(str::to_owned).collect(),
                _ => return None,
            };
            (!codes.is_empty()).then(|| (field.clone(), codes))
        })
        .collect()
}

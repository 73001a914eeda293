// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

pub const DEFAULT_LANG: &str = "en";

// Dicionários embutidos no binário
const BUNDLES: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Mensagens traduzidas por idioma. Barato de clonar (Arc).
#[derive(Clone, Debug, Default)]
pub struct I18nStore {
    messages: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    pub fn load() -> Self {
        let mut messages = HashMap::new();
        for (lang, raw) in BUNDLES {
            match serde_json::from_str::<HashMap<String, String>>(raw) {
                Ok(dict) => {
                    messages.insert(lang.to_string(), dict);
                }
                Err(e) => tracing::error!("🔥 Dicionário '{}' inválido: {}", lang, e),
            }
        }
        Self { messages: Arc::new(messages) }
    }

    /// Busca no idioma pedido, depois em inglês, e por fim devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .messages
            .get(lang)
            .and_then(|dict| dict.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|dict| dict.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string());

        params.iter().fold(template, |acc, (name, value)| {
            acc.replace(&format!("{{{name}}}"), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundles_have_the_same_keys() {
        let en: HashMap<String, String> = serde_json::from_str(BUNDLES[0].1).unwrap();
        let pt: HashMap<String, String> = serde_json::from_str(BUNDLES[1].1).unwrap();
        let mut en_keys: Vec<_> = en.keys().collect();
        let mut pt_keys: Vec<_> = pt.keys().collect();
        en_keys.sort();
        pt_keys.sort();
        assert_eq!(en_keys, pt_keys);
    }

    #[test]
    fn falls_back_to_english_then_key() {
        let store = I18nStore::load();
        assert_eq!(store.translate("pt", "error.empty_cart", &[]), "Seu carrinho está vazio.");
        assert_eq!(store.translate("de", "error.empty_cart", &[]), "Your cart is empty.");
        assert_eq!(store.translate("pt", "error.nope", &[]), "error.nope");
    }

    #[test]
    fn placeholders_are_replaced() {
        let store = I18nStore::load();
        let msg = store.translate("en", "error.unknown_tag", &[("tag", "summer".into())]);
        assert_eq!(msg, "Unknown tag: summer.");
    }
}

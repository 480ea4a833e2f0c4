use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use std::collections::HashMap;
use unic_langid::LanguageIdentifier;

use anyhow::Result;

pub const DEFAULT_LANGUAGE: &str = "ru";

const RESOURCES: &[(&str, &str)] = &[
    ("ru", include_str!("../locales/ru/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localized message catalog for the bot
pub struct Catalog {
    bundles: HashMap<&'static str, FluentBundle<FluentResource>>,
}

impl Catalog {
    /// Build the catalog from the embedded Fluent resources
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();
        for (lang, source) in RESOURCES {
            bundles.insert(*lang, Self::create_bundle(lang, source)?);
        }
        Ok(Self { bundles })
    }

    fn create_bundle(lang: &str, source: &str) -> Result<FluentBundle<FluentResource>> {
        let locale: LanguageIdentifier = lang.parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        // Keep output free of bidi isolation marks; replies are plain text
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow::anyhow!("Invalid {lang} resource: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Duplicate {lang} messages: {errors:?}"))?;

        Ok(bundle)
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.bundles.contains_key(lang)
    }

    /// Get a localized message
    pub fn get(&self, key: &str, lang: &str) -> String {
        self.render(key, None, lang)
    }

    /// Get a localized message with simple string arguments
    pub fn get_with_args(&self, key: &str, args: &[(&str, &str)], lang: &str) -> String {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, value.to_string());
        }
        self.render(key, Some(&fluent_args), lang)
    }

    fn render(&self, key: &str, args: Option<&FluentArgs>, lang: &str) -> String {
        let candidates = [lang, DEFAULT_LANGUAGE];
        for candidate in candidates {
            let Some(bundle) = self.bundles.get(candidate) else {
                continue;
            };
            let Some(pattern) = bundle.get_message(key).and_then(|msg| msg.value()) else {
                continue;
            };
            let mut errors = vec![];
            return bundle.format_pattern(pattern, args, &mut errors).into_owned();
        }
        format!("Missing translation: {key}")
    }
}

/// Map a Telegram language code onto a supported catalog language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    match language_code {
        Some(code) if code.to_ascii_lowercase().starts_with("en") => "en",
        _ => DEFAULT_LANGUAGE,
    }
}

use crate::graph::{Branch, EntityGraph};
use crate::ontology::Ontology;

use super::{Capabilities, Reasoner, ReasonerOutput};

/// Derives muted labels for updated entities: the lowercase form of every
/// spoken label and `_`-separated words joined with spaces. Entities
/// without labels get the same treatment for their identifier, in the
/// ontology's current language.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryReasoner;

fn variants(label: &str) -> Vec<String> {
    let spaced = label.replace('_', " ");
    let mut out = Vec::with_capacity(3);
    for candidate in [spaced.clone(), label.to_lowercase(), spaced.to_lowercase()] {
        if candidate != label && !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

fn enrich<B: Branch>(graph: &mut EntityGraph<B>, default_lang: &str) -> usize {
    let mut pending = Vec::new();
    for handle in graph.updated() {
        let Some(branch) = graph.get(handle) else { continue };
        let meta = branch.meta();
        if meta.dictionary.spoken.values().all(Vec::is_empty) {
            pending.push((handle, default_lang.to_string(), meta.name.clone()));
        }
        for (lang, labels) in &meta.dictionary.spoken {
            for label in labels {
                pending.push((handle, lang.clone(), label.clone()));
            }
        }
    }
    let mut added = 0;
    for (handle, lang, label) in pending {
        for variant in variants(&label) {
            let spoken = graph
                .get(handle)
                .is_some_and(|b| b.meta().dictionary.spoken(&lang).contains(&variant));
            if !spoken && graph.add_muted_label(handle, &lang, &variant) {
                added += 1;
            }
        }
    }
    added
}

impl Reasoner for DictionaryReasoner {
    fn name(&self) -> &str {
        "dictionary"
    }

    fn description(&self) -> &str {
        "This reasoner adds lowercase and space-separated variants of labels to the muted dictionary."
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            pre: false,
            post: true,
            periodic: false,
        }
    }

    fn post_reason(&mut self, ontology: &Ontology, _out: &mut ReasonerOutput) {
        let lang = ontology.language();
        let added = enrich(&mut *ontology.individuals_mut(), &lang)
            + enrich(&mut *ontology.classes_mut(), &lang)
            + enrich(&mut *ontology.object_properties_mut(), &lang)
            + enrich(&mut *ontology.data_properties_mut(), &lang);
        tracing::debug!(added, "muted labels derived");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_skip_the_original() {
        assert_eq!(variants("big_Dog"), vec!["big Dog".to_string(), "big_dog".to_string(), "big dog".to_string()]);
        assert!(variants("cat").is_empty());
    }

    #[test]
    fn test_muted_labels_are_searchable() {
        let ontology = Ontology::default();
        ontology.add_inheritance("Guide_Dog", "Dog").unwrap();
        ontology.add_label("Dog", "en", "Hound").unwrap();
        DictionaryReasoner.post_reason(&ontology, &mut ReasonerOutput::default());

        let classes = ontology.class();
        assert_eq!(classes.find("guide dog"), std::collections::HashSet::from(["Guide_Dog".to_string()]));
        assert_eq!(classes.find("hound"), std::collections::HashSet::from(["Dog".to_string()]));
        assert_eq!(classes.get_names("Dog"), vec!["Hound".to_string()]);
        assert!(classes.get_every_names("Dog").contains(&"hound".to_string()));
    }
}

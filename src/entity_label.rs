//! ## Entity Labels
//! An entity label names a set of entities of a document: every entity with a mention matched by
//! the label's pattern. Mention patterns consult the labels through `entitylabel` and `block`.

use log::trace;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::features::PatternFeatureSet;
use crate::matcher::PatternMatcher;
use crate::pattern::PatternId;
use crate::theory::{EntityId, MentionUid};

/// `(LABEL pattern)` of the `entitylabels` section.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityLabelPattern {
    pub label: String,
    pub pattern: PatternId,
}

/// The entities `label_pattern` applies to, each with the best scoring mention match.
pub fn label_entities(
    pm: &PatternMatcher,
    label_pattern: &EntityLabelPattern,
) -> Result<FxHashMap<EntityId, PatternFeatureSet>> {
    let doc = pm.doc();
    let mut labels: FxHashMap<EntityId, PatternFeatureSet> = FxHashMap::default();
    for (sentence, st) in doc.sentences.iter().enumerate() {
        for mention in st.mention_ids() {
            let Some(entity) = doc.entity_of(MentionUid { sentence, mention }) else {
                continue;
            };
            let Some(set) = pm.match_mention(label_pattern.pattern, sentence, mention, false)? else {
                continue;
            };
            trace!("{} labels entity {} through sentence {sentence}", label_pattern.label, entity.0);
            match labels.get(&entity) {
                Some(best) if best.score() >= set.score() => {}
                _ => {
                    labels.insert(entity, set);
                }
            }
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod test {
    use crate::entity_label::label_entities;
    use crate::matcher::{MatchConfig, PatternMatcher};
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::theory::{DocTheory, Entity, EntityId, Mention, MentionType, MentionUid, SentenceTheory};

    #[test]
    fn basic_entity_label_test() {
        let mut doc = DocTheory::new("doc");
        let mut first = SentenceTheory::from_treebank(0, "(S (NP (NNP Obama)) (VP (VBD spoke)))").unwrap();
        let np = first.parse.find("NP", 0, 0).unwrap();
        let obama = first.add_mention(Mention::new(np, MentionType::Name, "PER"));
        doc.add_sentence(first);
        let mut second = SentenceTheory::from_treebank(1, "(S (NP (PRP He)) (VP (VBD left)))").unwrap();
        let np = second.parse.find("NP", 0, 0).unwrap();
        let he = second.add_mention(Mention::new(np, MentionType::Pron, "PER"));
        doc.add_sentence(second);
        doc.add_entity(Entity {
            entity_type: "PER".to_string(),
            subtype: None,
            generic: false,
            mentions: vec![
                MentionUid {
                    sentence: 0,
                    mention: obama,
                },
                MentionUid {
                    sentence: 1,
                    mention: he,
                },
            ],
        });

        let set = PatternSet::from_str(
            "(s (entitylabels (PRESIDENT (mention (headword Obama)))) \
                (toplevel (mention (mentiontype pron) (entitylabel PRESIDENT))))",
            &LoadOptions::default(),
        )
        .unwrap();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let labels = label_entities(&matcher, &set.entity_label_patterns()[0]).unwrap();
        assert_eq!(labels.len(), 1);
        assert!(labels.contains_key(&EntityId(0)));
        // The pronoun matches through the label of its entity.
        assert!(matcher.match_sentence(set.top_level()[0], 1).unwrap().is_some());
    }
}

//! ## Value Mention Patterns
//! A [ValueMentionPattern] matches dates, money and other values. Besides the value type it can
//! constrain the timex of the document value: relative to the activity range of the matcher,
//! to specific dates, to dates shortly before the document date or to dates after it.

use chrono::{Datelike, NaiveDate};
use log::warn;

use crate::error::{PatternError, Result};
use crate::features::{FeatureKind, PatternFeatureSet};
use crate::matcher::{PatternMatcher, merge_matches};
use crate::mention_pattern::{ComparisonOp, FrequencyScope};
use crate::pattern::{ParseContext, Pattern, PatternId, PatternKind, PatternParser};
use crate::sexp::{Sexp, unquote};
use crate::theory::{Argument, ArgumentValue, NodeId, TEMP_ROLE, ValueMentionId};

/// Where a timex lies relative to an activity range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStatus {
    InRange,
    OutOfRange,
    /// A year that only partially overlaps the range.
    TooBroad,
    #[default]
    NotSpecific,
}

impl DateStatus {
    pub fn name(&self) -> &'static str {
        match self {
            DateStatus::InRange => "IN_RANGE",
            DateStatus::OutOfRange => "OUT_OF_RANGE",
            DateStatus::TooBroad => "TOO_BROAD",
            DateStatus::NotSpecific => "NOT_SPECIFIC",
        }
    }
}

/// The leading `YYYY[-MM[-DD]]` or `YYYY-Www` part of a timex value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimexPrefix {
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
    week: Option<u32>,
    /// The timex is the bare year.
    exact_year: bool,
    /// The year is followed by a hyphen.
    hyphen: bool,
}

/// Split off up to `max` leading ascii digits.
fn leading_digits(text: &str, max: usize) -> (&str, &str) {
    let len = text.bytes().take(max).take_while(u8::is_ascii_digit).count();
    text.split_at(len)
}

fn parse_timex(timex: &str) -> Option<TimexPrefix> {
    let (year, rest) = leading_digits(timex, 4);
    if year.len() != 4 || !matches!(year.as_bytes()[0], b'1' | b'2') {
        return None;
    }
    let mut prefix = TimexPrefix {
        year: year.parse().ok()?,
        month: None,
        day: None,
        week: None,
        exact_year: rest.is_empty(),
        hyphen: rest.starts_with('-'),
    };
    let Some(rest) = rest.strip_prefix('-') else {
        return Some(prefix);
    };
    if let Some(week) = rest.strip_prefix('W') {
        let (week, _) = leading_digits(week, 2);
        if week.len() == 2 && week.as_bytes()[0] <= b'5' {
            prefix.week = week.parse().ok();
        }
        return Some(prefix);
    }
    let (month, rest) = leading_digits(rest, 2);
    if month.is_empty() || (month.len() == 2 && month.as_bytes()[0] > b'3') {
        return Some(prefix);
    }
    prefix.month = month.parse().ok();
    if let Some(rest) = rest.strip_prefix('-') {
        let (day, _) = leading_digits(rest, 2);
        if !day.is_empty() && !(day.len() == 2 && day.as_bytes()[0] > b'3') {
            prefix.day = day.parse().ok();
        }
    }
    Some(prefix)
}

impl TimexPrefix {
    /// The full date, if the timex names a valid day.
    fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month?, self.day?)
    }
}

/// Classify `timex` against the inclusive range `[start, end]`.
pub fn date_status(timex: &str, (start, end): (NaiveDate, NaiveDate)) -> DateStatus {
    let Some(prefix) = parse_timex(timex) else {
        return DateStatus::NotSpecific;
    };
    let year = prefix.year;
    let status = |in_range: bool| {
        if in_range {
            DateStatus::InRange
        } else {
            DateStatus::OutOfRange
        }
    };
    match (prefix.month, prefix.day, prefix.week) {
        (Some(month), Some(day), _) => {
            let date = (year, month, day);
            status((start.year(), start.month(), start.day()) <= date && date <= (end.year(), end.month(), end.day()))
        }
        // A month in range if it overlaps the range.
        (Some(month), None, _) => {
            status((start.year(), start.month()) <= (year, month) && (year, month) <= (end.year(), end.month()))
        }
        (None, _, Some(week)) => {
            let (first, last) = (start.iso_week(), end.iso_week());
            status((first.year(), first.week()) <= (year, week) && (year, week) <= (last.year(), last.week()))
        }
        _ => {
            if year < start.year() || year > end.year() {
                return DateStatus::OutOfRange;
            }
            let covers_start = year > start.year() || (start.month() == 1 && start.day() == 1);
            let covers_end = year < end.year() || (end.month() == 12 && end.day() == 31);
            if covers_start && covers_end {
                DateStatus::InRange
            } else {
                DateStatus::TooBroad
            }
        }
    }
}

/// `(doc_vtype_freq OP N)` or `(sent_vtype_freq OP N)`: how many values of the same type
/// the document or the sentence contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyConstraint {
    pub scope: FrequencyScope,
    pub op: ComparisonOp,
    pub value: i64,
}

impl FrequencyConstraint {
    pub fn name(&self) -> &'static str {
        match self.scope {
            FrequencyScope::Document => "doc_vtype_freq",
            FrequencyScope::Sentence => "sent_vtype_freq",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueMentionPattern {
    pub value_types: Vec<String>,
    pub activity_date: DateStatus,
    pub specific_date: bool,
    pub recent_date: bool,
    pub future_date: bool,
    pub frequencies: Vec<FrequencyConstraint>,
    pub regex: Option<PatternId>,
}

impl PatternParser for ValueMentionPattern {
    const TYPE_NAME: &'static str = "ValueMentionPattern";

    fn init_atom(&mut self, atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        match atom {
            "SPECIFIC-DATE" => self.specific_date = true,
            "RECENT-DATE" => self.recent_date = true,
            "FUTURE-DATE" => self.future_date = true,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        let Some(head) = sexp.head() else {
            return Ok(false);
        };
        let err = |reason: &str| PatternError::parse(Self::TYPE_NAME, reason, sexp);
        match head {
            "type" => {
                for child in sexp.children()?.iter().skip(1) {
                    let name = child.value().ok_or_else(|| err("value type must be atomic"))?;
                    self.value_types.push(unquote(name).to_string());
                }
            }
            "activity-date" => {
                self.activity_date = match sexp.nth_child(1)?.value() {
                    Some("IN_RANGE") => DateStatus::InRange,
                    Some("OUT_OF_RANGE") => DateStatus::OutOfRange,
                    Some("NOT_SPECIFIC") => DateStatus::NotSpecific,
                    _ => return Err(err("activity-date must be IN_RANGE or OUT_OF_RANGE")),
                }
            }
            "doc_vtype_freq" | "sent_vtype_freq" => {
                let (Some(op), Some(value)) = (sexp.nth_child(1)?.value(), sexp.nth_child(2)?.value()) else {
                    return Err(err("comparison constraints must have three atomic children"));
                };
                if sexp.num_children()? != 3 {
                    return Err(err("comparison constraints must have three atomic children"));
                }
                let op = ComparisonOp::from_name(op)
                    .ok_or_else(|| err("comparison operator must be ==, !=, <, >, <=, or >="))?;
                let value = value
                    .parse()
                    .map_err(|_| err("comparison value must be an integer"))?;
                let scope = if head == "doc_vtype_freq" {
                    FrequencyScope::Document
                } else {
                    FrequencyScope::Sentence
                };
                self.frequencies.push(FrequencyConstraint { scope, op, value });
            }
            "regex" => {
                if self.regex.is_some() {
                    return Err(err("more than one regex in ValueMentionPattern"));
                }
                let id = ctx.parse(sexp.nth_child(1)?)?;
                if !matches!(ctx.bank.get(id).kind, PatternKind::Regex(_) | PatternKind::Shortcut(_)) {
                    return Err(err("Expected a regex pattern"));
                }
                self.regex = Some(id);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::ValueMention(self)
    }
}

impl ValueMentionPattern {
    pub fn matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Option<PatternFeatureSet>> {
        Ok(merge_matches(self.multi_matches_sentence(pm, pattern, sentence)?))
    }

    pub fn multi_matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Vec<PatternFeatureSet>> {
        let mut matches = Vec::new();
        for value_mention in 0..pm.doc().sentence(sentence).value_mentions.len() {
            matches.extend(self.matches_value_mention(pm, pattern, sentence, ValueMentionId(value_mention))?);
        }
        Ok(matches)
    }

    /// A mention argument matches through the value mention with the same extent. Temporal
    /// arguments also match a value mention nested inside the mention.
    pub fn matches_argument_value(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        arg: &Argument,
    ) -> Result<Option<PatternFeatureSet>> {
        let ArgumentValue::Mention(mention) = arg.value else {
            return Ok(None);
        };
        let st = pm.doc().sentence(sentence);
        let (start, end) = st.mention_span(mention);
        for (index, vm) in st.value_mentions.iter().enumerate() {
            let exact = vm.start_token == start && vm.end_token == end;
            let nested = arg.role == TEMP_ROLE && vm.start_token >= start && vm.end_token <= end;
            if exact || nested {
                return self.matches_value_mention(pm, pattern, sentence, ValueMentionId(index));
            }
        }
        Ok(None)
    }

    /// Match a value mention spanning exactly the node.
    pub fn matches_parse_node(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        node: NodeId,
    ) -> Result<Option<PatternFeatureSet>> {
        let st = pm.doc().sentence(sentence);
        let node = st.parse.node(node);
        for (index, vm) in st.value_mentions.iter().enumerate() {
            if vm.start_token == node.start_token && vm.end_token == node.end_token {
                if let Some(set) = self.matches_value_mention(pm, pattern, sentence, ValueMentionId(index))? {
                    return Ok(Some(set));
                }
            }
        }
        Ok(None)
    }

    pub fn matches_value_mention(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        value_mention: ValueMentionId,
    ) -> Result<Option<PatternFeatureSet>> {
        let doc = pm.doc();
        let vm = doc.sentence(sentence).value_mention(value_mention);
        let timex = vm.value.and_then(|v| doc.value(v).timex.as_deref());

        if self.activity_date != DateStatus::NotSpecific {
            let Some(range) = pm.activity_range() else {
                return Ok(None);
            };
            if vm.value.is_some() && date_status(timex.unwrap_or_default(), range) != self.activity_date {
                return Ok(None);
            }
        }

        let dated = self.specific_date || self.recent_date || self.future_date;
        if dated && vm.value.is_none() {
            warn!("Value has not been created, value mention date constraints are ignored");
        } else if dated {
            let prefix = timex.and_then(parse_timex);
            if self.specific_date && !prefix.is_some_and(|p| p.exact_year || p.hyphen) {
                return Ok(None);
            }
            if self.recent_date || self.future_date {
                let Some(doc_date) = doc.date else {
                    return Ok(None);
                };
                if self.recent_date {
                    let Some(date) = prefix.and_then(|p| p.date()) else {
                        return Ok(None);
                    };
                    if doc_date < date || (doc_date - date).num_days() > pm.config().recent_days {
                        return Ok(None);
                    }
                }
                if self.future_date {
                    let in_future = match prefix {
                        Some(p) if p.month.is_some() && p.day.is_some() => p.date().is_some_and(|d| d > doc_date),
                        Some(p) => p.year > doc_date.year(),
                        None => false,
                    };
                    if !in_future {
                        return Ok(None);
                    }
                }
            }
        }

        for frequency in &self.frequencies {
            let actual = match frequency.scope {
                FrequencyScope::Document => doc.values.iter().filter(|v| v.full_type == vm.value_type).count(),
                FrequencyScope::Sentence => doc
                    .sentence(sentence)
                    .value_mentions
                    .iter()
                    .filter(|other| other.value_type == vm.value_type)
                    .count(),
            };
            if !frequency.op.holds(actual as i64, frequency.value) {
                return Ok(None);
            }
        }

        if !self.value_types.is_empty() && !self.value_types.contains(&vm.value_type) {
            return Ok(None);
        }

        let variant = pm.language_variant();
        let kind = FeatureKind::ValueMention {
            sentence,
            value_mention,
        };
        let mut set = PatternFeatureSet::new();
        if let Some(ret) = pattern.return_feature(kind.clone(), variant) {
            set.add_feature(ret);
        }
        set.add_feature(pattern.feature(kind, variant));
        pattern.add_id(&mut set, variant);
        if let Some(regex) = self.regex {
            match pm.match_value_mention(regex, sentence, value_mention)? {
                Some(regex_match) => set.add_features(&regex_match),
                None => return Ok(None),
            }
        }
        set.set_score(pattern.score());
        Ok(Some(set))
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use crate::features::FeatureKind;
    use crate::matcher::{MatchConfig, PatternMatcher};
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::theory::{DocTheory, SentenceTheory, Value, ValueMention, ValueMentionId};
    use crate::value_mention_pattern::{DateStatus, date_status};

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2010, 3, 15).unwrap(),
            NaiveDate::from_ymd_opt(2010, 6, 30).unwrap(),
        )
    }

    #[test]
    fn basic_date_status_test() {
        assert_eq!(date_status("2010-04-01", range()), DateStatus::InRange);
        assert_eq!(date_status("2010-03-01", range()), DateStatus::OutOfRange);
        assert_eq!(date_status("2010-03", range()), DateStatus::InRange);
        assert_eq!(date_status("2010-W20", range()), DateStatus::InRange);
        assert_eq!(date_status("2009", range()), DateStatus::OutOfRange);
        assert_eq!(date_status("2010", range()), DateStatus::TooBroad);
        assert_eq!(date_status("PRESENT_REF", range()), DateStatus::NotSpecific);
    }

    fn document() -> DocTheory {
        let mut doc = DocTheory::new("doc");
        doc.date = NaiveDate::from_ymd_opt(2010, 5, 1);
        let mut st =
            SentenceTheory::from_treebank(0, "(S (NP (NNP Smith)) (VP (VBD left) (NP (NNP April) (CD 20))))").unwrap();
        let date = doc.add_value(Value {
            full_type: "TIMEX2.TIME".to_string(),
            timex: Some("2010-04-20".to_string()),
        });
        st.add_value_mention(ValueMention {
            value_type: "TIMEX2.TIME".to_string(),
            start_token: 2,
            end_token: 3,
            value: Some(date),
        });
        doc.add_sentence(st);
        doc
    }

    fn count(text: &str, config: MatchConfig) -> usize {
        let doc = document();
        let set = PatternSet::from_str(text, &LoadOptions::default()).unwrap();
        let matcher = PatternMatcher::new(&doc, &set, config).unwrap();
        matcher.multi_match_sentence(set.top_level()[0], 0).unwrap().len()
    }

    #[test]
    fn value_constraints_test() {
        assert_eq!(count("(s (toplevel (value (return X))))", MatchConfig::default()), 1);
        assert_eq!(count("(s (toplevel (value (type TIMEX2.TIME) SPECIFIC-DATE)))", MatchConfig::default()), 1);
        assert_eq!(count("(s (toplevel (value (type MONEY))))", MatchConfig::default()), 0);
        assert_eq!(count("(s (toplevel (value RECENT-DATE)))", MatchConfig::default()), 1);
        let config = MatchConfig {
            recent_days: 5,
            ..MatchConfig::default()
        };
        assert_eq!(count("(s (toplevel (value RECENT-DATE)))", config), 0);
        assert_eq!(count("(s (toplevel (value FUTURE-DATE)))", MatchConfig::default()), 0);
        assert_eq!(count("(s (toplevel (value (sent_vtype_freq == 1))))", MatchConfig::default()), 1);
        assert_eq!(count("(s (toplevel (value (doc_vtype_freq > 1))))", MatchConfig::default()), 0);
    }

    #[test]
    fn activity_date_test() {
        assert_eq!(count("(s (toplevel (value (activity-date IN_RANGE))))", MatchConfig::default()), 0);
        let config = MatchConfig {
            activity_range: Some(range()),
            ..MatchConfig::default()
        };
        assert_eq!(count("(s (toplevel (value (activity-date IN_RANGE))))", config.clone()), 1);
        assert_eq!(count("(s (toplevel (value (activity-date OUT_OF_RANGE))))", config), 0);
    }

    #[test]
    fn value_return_test() {
        let doc = document();
        let set = PatternSet::from_str("(s (toplevel (value (return DATE))))", &LoadOptions::default()).unwrap();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let matched = matcher.match_sentence(set.top_level()[0], 0).unwrap().unwrap();
        let ret = matched.returns().next().unwrap();
        assert_eq!(
            ret.kind,
            FeatureKind::ValueMention {
                sentence: 0,
                value_mention: ValueMentionId(0)
            }
        );
    }

    #[test]
    fn value_errors_test() {
        assert!(PatternSet::from_str("(s (toplevel (value (activity-date SOMETIME))))", &LoadOptions::default()).is_err());
        assert!(PatternSet::from_str("(s (toplevel (value (doc_vtype_freq ~ 1))))", &LoadOptions::default()).is_err());
    }
}

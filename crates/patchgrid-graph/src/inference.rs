//! Pair inference: decides whether a freshly added mono port completes a
//! stereo/grouped pair, without user interaction.
//!
//! Three sources are consulted in priority order, first match wins:
//!
//! 1. the in-session cache of pairings seen earlier (so split/join replay
//!    and remove/re-add cycles reconstruct their pairs),
//! 2. explicit pairing rules persisted in the position store,
//! 3. a naming-suffix heuristic, only when
//!    [`GraphOptions::auto_pair_heuristic`](crate::GraphOptions) is set.
//!
//! A force-mono override on any involved port vetoes all three.

use crate::store::PairingRule;
use crate::{GroupId, PairId, PortId, PortMode, PortType};
use crate::GraphModel;

const SEPARATORS: &[char] = &[' ', '_', '.', '-', '#', ':'];

impl GraphModel {
    /// Runs inference for the port just inserted at the end of the registry.
    pub(crate) fn infer_pair_for(&mut self, group_id: GroupId, port_id: PortId) {
        let Some(port) = self.port(group_id, port_id) else {
            return;
        };
        let (mode, port_type) = (port.mode, port.port_type);
        let port_name = port.name.clone();
        let Some(group) = self.group(group_id) else {
            return;
        };
        let group_name = group.name.clone();

        if self.store.is_force_mono(&group_name, &port_name, mode) {
            return;
        }

        // Cousins: ports of the same group, mode and type, in registration
        // order. The new port was pushed last, so it closes the sequence.
        let cousins: Vec<(PortId, String)> = self
            .ports
            .iter()
            .filter(|p| p.group_id == group_id && p.mode == mode && p.port_type == port_type)
            .map(|p| (p.port_id, p.name.clone()))
            .collect();
        debug_assert_eq!(cousins.last().map(|c| c.0), Some(port_id));

        let members = matching_members(&self.session_rules, &group_name, mode, &cousins)
            .or_else(|| {
                let persisted = self.store.pairing_rules(&group_name, mode);
                matching_members(&persisted, &group_name, mode, &cousins)
            })
            .or_else(|| {
                if !self.options.auto_pair_heuristic {
                    return None;
                }
                self.heuristic_members(&group_name, mode, &cousins)
            });

        if let Some(members) = members {
            self.commit_inferred_pair(group_id, mode, port_type, members);
        }
    }

    /// Suffix heuristic: proposes the immediately preceding cousin as the
    /// left channel when the two names form one of the known stereo
    /// patterns and neither port is forced mono.
    fn heuristic_members(
        &self,
        group_name: &str,
        mode: PortMode,
        cousins: &[(PortId, String)],
    ) -> Option<Vec<PortId>> {
        if cousins.len() < 2 {
            return None;
        }
        let (new_id, new_name) = cousins.last()?;
        let (prev_id, prev_name) = &cousins[cousins.len() - 2];
        if !stereo_suffix_match(prev_name, new_name) {
            return None;
        }
        if self.store.is_force_mono(group_name, prev_name, mode) {
            return None;
        }
        Some(vec![*prev_id, *new_id])
    }

    /// Creates the inferred pair, first absorbing any existing pair whose
    /// membership is a subset of the new one (rule continuation). A pair
    /// that only partially overlaps wins instead: the inference backs off.
    fn commit_inferred_pair(
        &mut self,
        group_id: GroupId,
        mode: PortMode,
        port_type: PortType,
        members: Vec<PortId>,
    ) {
        let mut subsumed: Vec<PairId> = Vec::new();
        for &member in &members {
            let Some(pair_id) = self.port(group_id, member).and_then(|p| p.pair) else {
                continue;
            };
            if subsumed.contains(&pair_id) {
                continue;
            }
            let Some(pair) = self.pair(pair_id) else {
                continue;
            };
            if pair.ports.iter().all(|p| members.contains(p)) {
                subsumed.push(pair_id);
            } else {
                return;
            }
        }
        for pair_id in subsumed {
            self.drop_pair_silently(pair_id);
            self.listener.on_pair_dissolved(group_id, pair_id);
        }

        match self.create_pair(group_id, mode, port_type, &members) {
            Ok(pair_id) => {
                if let Some(index) = self.pair_index(pair_id) {
                    if let Some(rule) = self.rule_for_pair_at(index) {
                        self.record_session_rule(rule);
                    }
                }
            }
            Err(err) => tracing::warn!(%err, "inferred pair rejected"),
        }
    }
}

/// Finds the first rule whose full name sequence ends exactly at the new
/// port, with the earlier names matching the preceding cousins in order.
/// A partially present sequence never commits.
fn matching_members(
    rules: &[PairingRule],
    group: &str,
    mode: PortMode,
    cousins: &[(PortId, String)],
) -> Option<Vec<PortId>> {
    let (_, new_name) = cousins.last()?;
    for rule in rules {
        if rule.group != group || rule.mode != mode {
            continue;
        }
        let len = rule.port_names.len();
        if len < 2 || len > cousins.len() {
            continue;
        }
        if rule.port_names.last().map(String::as_str) != Some(new_name.as_str()) {
            continue;
        }
        let window = &cousins[cousins.len() - len..];
        if window
            .iter()
            .zip(&rule.port_names)
            .all(|((_, name), wanted)| name == wanted)
        {
            return Some(window.iter().map(|(id, _)| *id).collect());
        }
    }
    None
}

fn split_trailing_number(s: &str) -> Option<(&str, u32)> {
    let stem_len = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if stem_len == s.len() {
        return None;
    }
    let (stem, digits) = s.split_at(stem_len);
    digits.parse().ok().map(|n| (stem, n))
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if s.len() < suffix.len() || !s.is_char_boundary(s.len() - suffix.len()) {
        return None;
    }
    let (head, tail) = s.split_at(s.len() - suffix.len());
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

/// True when `first`/`second` look like the left and right channels of a
/// stereo pair: `left`/`right` on a shared stem, a separated (or bare)
/// `L`/`R`, or an odd/even numeric channel suffix (`1`/`2`, `3`/`4`).
fn stereo_suffix_match(first: &str, second: &str) -> bool {
    if let (Some((stem_a, a)), Some((stem_b, b))) =
        (split_trailing_number(first), split_trailing_number(second))
    {
        if stem_a == stem_b && a % 2 == 1 && a.checked_add(1) == Some(b) {
            return true;
        }
    }
    if let (Some(stem_a), Some(stem_b)) =
        (strip_suffix_ci(first, "left"), strip_suffix_ci(second, "right"))
    {
        if stem_a == stem_b {
            return true;
        }
    }
    if let (Some(stem_a), Some(stem_b)) = (strip_suffix_ci(first, "l"), strip_suffix_ci(second, "r"))
    {
        if stem_a == stem_b && (stem_a.is_empty() || stem_a.ends_with(SEPARATORS)) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        GraphModel, GraphOptions, GroupIcon, GroupId, MemoryStore, NullListener, NullSink,
        PositionStore, SplitHint,
    };

    use super::*;

    #[test]
    fn suffix_patterns() {
        assert!(stereo_suffix_match("out L", "out R"));
        assert!(stereo_suffix_match("L", "R"));
        assert!(stereo_suffix_match("out_l", "out_r"));
        assert!(stereo_suffix_match("MonitorLeft", "MonitorRight"));
        assert!(stereo_suffix_match("capture_1", "capture_2"));
        assert!(stereo_suffix_match("capture_3", "capture_4"));

        // even/odd boundary is not a pair
        assert!(!stereo_suffix_match("capture_2", "capture_3"));
        // different stems
        assert!(!stereo_suffix_match("mic L", "aux R"));
        // no separator before a single-letter suffix
        assert!(!stereo_suffix_match("vocal", "vocar"));
        assert!(!stereo_suffix_match("out R", "out L"));
        // suffix at the top of the id range must not wrap
        assert!(!stereo_suffix_match("in 4294967295", "in 0"));
    }

    fn heuristic_model(store: std::sync::Arc<MemoryStore>, enabled: bool) -> GraphModel {
        let mut model = GraphModel::with_options(
            Box::new(store),
            Box::new(NullListener),
            Box::new(NullSink),
            GraphOptions {
                auto_pair_heuristic: enabled,
                ..GraphOptions::default()
            },
        );
        model
            .add_group(GroupId(1), "synth", SplitHint::Joined, GroupIcon::Plugin)
            .unwrap();
        model
    }

    fn add_stereo_outs(model: &mut GraphModel) {
        use crate::{PortId, PortType};
        model
            .add_port(
                GroupId(1),
                PortId(1),
                "out L",
                PortMode::Output,
                PortType::Audio,
                false,
            )
            .unwrap();
        model
            .add_port(
                GroupId(1),
                PortId(2),
                "out R",
                PortMode::Output,
                PortType::Audio,
                false,
            )
            .unwrap();
    }

    #[test]
    fn heuristic_is_off_by_default() {
        let store = std::sync::Arc::new(MemoryStore::default());
        let mut model = heuristic_model(store, false);
        add_stereo_outs(&mut model);
        assert!(model.pairs().is_empty());
    }

    #[test]
    fn heuristic_pairs_suffixed_ports_when_enabled() {
        let store = std::sync::Arc::new(MemoryStore::default());
        let mut model = heuristic_model(store, true);
        add_stereo_outs(&mut model);
        assert_eq!(model.pairs().len(), 1);
        let pair = &model.pairs()[0];
        assert_eq!(pair.ports.as_slice(), &[crate::PortId(1), crate::PortId(2)]);
        assert_eq!(pair.name, "out");
    }

    #[test]
    fn force_mono_vetoes_the_heuristic() {
        let store = std::sync::Arc::new(MemoryStore::default());
        store.set_force_mono("synth", "out L", PortMode::Output, true);
        let mut model = heuristic_model(store, true);
        add_stereo_outs(&mut model);
        assert!(model.pairs().is_empty());
    }

    #[test]
    fn partial_rule_sequences_never_commit() {
        use crate::{PairingRule, PortId, PortType};
        let store = std::sync::Arc::new(MemoryStore::default());
        store.remember_pairing(PairingRule {
            group: "synth".into(),
            mode: PortMode::Output,
            port_names: vec!["a".into(), "b".into(), "c".into()],
        });
        let mut model = heuristic_model(store, false);
        for (id, name) in [(1, "a"), (2, "b")] {
            model
                .add_port(
                    GroupId(1),
                    PortId(id),
                    name,
                    PortMode::Output,
                    PortType::Audio,
                    false,
                )
                .unwrap();
        }
        assert!(model.pairs().is_empty());
        model
            .add_port(
                GroupId(1),
                PortId(3),
                "c",
                PortMode::Output,
                PortType::Audio,
                false,
            )
            .unwrap();
        assert_eq!(model.pairs().len(), 1);
        assert_eq!(
            model.pairs()[0].ports.as_slice(),
            &[PortId(1), PortId(2), PortId(3)]
        );
    }

    #[test]
    fn growing_rule_extends_an_existing_pair() {
        use crate::{PairingRule, PortId, PortType};
        let store = std::sync::Arc::new(MemoryStore::default());
        store.remember_pairing(PairingRule {
            group: "synth".into(),
            mode: PortMode::Output,
            port_names: vec!["a".into(), "b".into()],
        });
        store.remember_pairing(PairingRule {
            group: "synth".into(),
            mode: PortMode::Output,
            port_names: vec!["a".into(), "b".into(), "c".into()],
        });
        let mut model = heuristic_model(store, false);
        for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
            model
                .add_port(
                    GroupId(1),
                    PortId(id),
                    name,
                    PortMode::Output,
                    PortType::Audio,
                    false,
                )
                .unwrap();
        }
        assert_eq!(model.pairs().len(), 1);
        assert_eq!(model.pairs()[0].ports.len(), 3);
    }
}

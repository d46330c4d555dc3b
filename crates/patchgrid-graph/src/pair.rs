//! Pair (port-group) records: ordered runs of ports rendered and operated as
//! one multi-channel unit, typically a stereo pair.

use smallvec::SmallVec;

use crate::store::PairingRule;
use crate::{GraphError, GraphModel, GroupId, PairId, PortId, PortMode, PortType};

/// An ordered sequence of two or more ports of one group sharing mode and
/// type. Order defines channel position; index 0 is the first/left channel.
/// Holds port ids only, never port lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub pair_id: PairId,
    pub group_id: GroupId,
    pub mode: PortMode,
    pub port_type: PortType,
    pub ports: SmallVec<[PortId; 2]>,
    /// Canonical display name derived from the member names.
    pub name: String,
}

const SEPARATORS: &[char] = &[' ', '_', '.', '-', '#', ':'];
const DIRECTION_TOKENS: &[&str] = &["input", "output", "in", "out"];

fn common_prefix_len(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        len += ca.len_utf8();
    }
    len
}

/// Removes one trailing separator character or direction token, or reports
/// that there is nothing left to trim.
fn trim_one(s: &str) -> Option<&str> {
    if let Some(stripped) = s.strip_suffix(SEPARATORS) {
        return Some(stripped);
    }
    for token in DIRECTION_TOKENS {
        if s.len() <= token.len() || !s.is_char_boundary(s.len() - token.len()) {
            continue;
        }
        let (head, tail) = s.split_at(s.len() - token.len());
        if tail.eq_ignore_ascii_case(token) && head.ends_with(SEPARATORS) {
            return Some(head);
        }
    }
    None
}

/// Canonical display name for a pair: the longest common prefix of the
/// member names, stripped of trailing separators and direction tokens.
/// Falls back to the raw prefix, then to the first member's name, whenever
/// trimming would leave nothing usable.
pub fn pair_display_name(names: &[&str]) -> String {
    let Some(&first) = names.first() else {
        return String::new();
    };
    let mut lcp_len = first.len();
    for name in &names[1..] {
        lcp_len = lcp_len.min(common_prefix_len(first, name));
    }
    let lcp = &first[..lcp_len];
    let mut prefix = lcp;
    while let Some(trimmed) = trim_one(prefix) {
        prefix = trimmed;
    }
    if !prefix.is_empty() && !names.contains(&prefix) {
        return prefix.to_string();
    }
    if !lcp.is_empty() && !names.contains(&lcp) {
        return lcp.to_string();
    }
    first.to_string()
}

impl GraphModel {
    pub fn pair(&self, pair_id: PairId) -> Option<&Pair> {
        self.pairs.iter().find(|pair| pair.pair_id == pair_id)
    }

    pub(crate) fn pair_index(&self, pair_id: PairId) -> Option<usize> {
        self.pairs.iter().position(|pair| pair.pair_id == pair_id)
    }

    /// Creates a pair from ports that all exist, share the group, mode and
    /// type, and belong to no other pair. Pair ids are never reused.
    pub fn create_pair(
        &mut self,
        group_id: GroupId,
        mode: PortMode,
        port_type: PortType,
        members: &[PortId],
    ) -> Result<PairId, GraphError> {
        if members.len() < 2 {
            return Err(GraphError::PairTooSmall(members.len()));
        }
        let mut names: Vec<String> = Vec::with_capacity(members.len());
        for &port_id in members {
            let port = self
                .port(group_id, port_id)
                .ok_or(GraphError::PortNotFound(group_id, port_id))?;
            if port.mode != mode || port.port_type != port_type {
                return Err(GraphError::PairMemberMismatch(port_id));
            }
            if let Some(existing) = port.pair {
                return Err(GraphError::AlreadyPaired(port_id, existing));
            }
            names.push(port.name.clone());
        }

        let pair_id = PairId(self.next_pair_id);
        self.next_pair_id += 1;

        for &port_id in members {
            if let Some(port) = self
                .ports
                .iter_mut()
                .find(|p| p.group_id == group_id && p.port_id == port_id)
            {
                port.pair = Some(pair_id);
            }
        }

        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        self.pairs.push(Pair {
            pair_id,
            group_id,
            mode,
            port_type,
            ports: SmallVec::from_slice(members),
            name: pair_display_name(&name_refs),
        });
        self.reorder_ports_after_pair(pair_id);
        self.listener.on_pair_created(group_id, pair_id);
        Ok(pair_id)
    }

    /// Explicitly merges ports of one group into a pair and remembers the
    /// choice in the position store so it survives the session.
    pub fn pair_ports(
        &mut self,
        group_id: GroupId,
        members: &[PortId],
    ) -> Result<PairId, GraphError> {
        let Some(&first) = members.first() else {
            return Err(GraphError::PairTooSmall(0));
        };
        let (mode, port_type) = {
            let port = self
                .port(group_id, first)
                .ok_or(GraphError::PortNotFound(group_id, first))?;
            (port.mode, port.port_type)
        };
        let pair_id = self.create_pair(group_id, mode, port_type, members)?;
        if let Some(index) = self.pair_index(pair_id) {
            if let Some(rule) = self.rule_for_pair_at(index) {
                self.store.remember_pairing(rule.clone());
                self.record_session_rule(rule);
            }
        }
        Ok(pair_id)
    }

    /// Explicitly splits a pair back to mono ports. Forgets persisted and
    /// session rules that exactly match, so inference does not immediately
    /// recreate it. The ports themselves are untouched.
    pub fn dissolve_pair(&mut self, pair_id: PairId) -> Result<(), GraphError> {
        let index = self
            .pair_index(pair_id)
            .ok_or(GraphError::PairNotFound(pair_id))?;
        let rule = self.rule_for_pair_at(index);
        let pair = self.pairs.remove(index);
        for &port_id in &pair.ports {
            self.clear_pair_backref(pair.group_id, port_id);
        }
        if let Some(rule) = rule {
            self.store.forget_pairing(&rule);
            self.session_rules.retain(|known| known != &rule);
        }
        self.listener.on_pair_dissolved(pair.group_id, pair_id);
        Ok(())
    }

    /// Channel position of a port inside its pair, `(0, 1)` when unpaired.
    pub fn port_position_within_pair(
        &self,
        group_id: GroupId,
        port_id: PortId,
    ) -> (usize, usize) {
        let paired = self
            .port(group_id, port_id)
            .and_then(|port| port.pair)
            .and_then(|pair_id| self.pair(pair_id))
            .and_then(|pair| {
                let index = pair.ports.iter().position(|&p| p == port_id)?;
                Some((index, pair.ports.len()))
            });
        paired.unwrap_or((0, 1))
    }

    /// Reacts to a member port going away: a two-member pair dissolves, a
    /// larger one shrinks. The full membership is recorded in the session
    /// cache first so a replayed port sequence re-forms the pair.
    pub(crate) fn shrink_or_dissolve_pair(&mut self, pair_id: PairId, leaving: PortId) {
        let Some(index) = self.pair_index(pair_id) else {
            tracing::warn!(?pair_id, "pair back-reference points at a missing pair");
            return;
        };
        if let Some(rule) = self.rule_for_pair_at(index) {
            self.record_session_rule(rule);
        }
        let group_id = self.pairs[index].group_id;
        if self.pairs[index].ports.len() <= 2 {
            let pair = self.pairs.remove(index);
            for &port_id in &pair.ports {
                self.clear_pair_backref(group_id, port_id);
            }
            self.listener.on_pair_dissolved(group_id, pair_id);
        } else {
            self.pairs[index].ports.retain(|&mut port_id| port_id != leaving);
            self.clear_pair_backref(group_id, leaving);
            self.refresh_pair_name(pair_id);
            self.listener.on_pair_changed(group_id, pair_id);
        }
    }

    /// Drops a pair record without rule bookkeeping or notification; used
    /// when the owning group disappears underneath it.
    pub(crate) fn drop_pair_silently(&mut self, pair_id: PairId) {
        let Some(index) = self.pair_index(pair_id) else {
            return;
        };
        let pair = self.pairs.remove(index);
        for &port_id in &pair.ports {
            self.clear_pair_backref(pair.group_id, port_id);
        }
    }

    pub(crate) fn refresh_pair_name(&mut self, pair_id: PairId) {
        let Some(index) = self.pair_index(pair_id) else {
            return;
        };
        let names: Vec<String> = self.pairs[index]
            .ports
            .iter()
            .filter_map(|&port_id| {
                self.port(self.pairs[index].group_id, port_id)
                    .map(|port| port.name.clone())
            })
            .collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        self.pairs[index].name = pair_display_name(&name_refs);
    }

    /// Pairing rule describing a pair's current membership by name, or
    /// `None` when the group or a member port is gone.
    pub(crate) fn rule_for_pair_at(&self, index: usize) -> Option<PairingRule> {
        let pair = self.pairs.get(index)?;
        let group = self.group(pair.group_id)?;
        let mut port_names = Vec::with_capacity(pair.ports.len());
        for &port_id in &pair.ports {
            port_names.push(self.port(pair.group_id, port_id)?.name.clone());
        }
        Some(PairingRule {
            group: group.name.clone(),
            mode: pair.mode,
            port_names,
        })
    }

    pub(crate) fn record_session_rule(&mut self, rule: PairingRule) {
        if !self.session_rules.contains(&rule) {
            self.session_rules.push(rule);
        }
    }

    fn clear_pair_backref(&mut self, group_id: GroupId, port_id: PortId) {
        if let Some(port) = self
            .ports
            .iter_mut()
            .find(|p| p.group_id == group_id && p.port_id == port_id)
        {
            port.pair = None;
        }
    }

    /// Moves non-member ports that registered between the pair's members to
    /// just after the pair, so rendering order matches logical grouping.
    /// The move is stable.
    pub(crate) fn reorder_ports_after_pair(&mut self, pair_id: PairId) {
        let Some(pair) = self.pair(pair_id) else {
            return;
        };
        let group_id = pair.group_id;
        let members: Vec<PortId> = pair.ports.to_vec();
        let is_member =
            |p: &crate::Port| p.group_id == group_id && members.contains(&p.port_id);

        let Some(first) = self.ports.iter().position(|p| is_member(p)) else {
            return;
        };
        let Some(last) = self.ports.iter().rposition(|p| is_member(p)) else {
            return;
        };
        if last + 1 - first == members.len() {
            return;
        }

        let span: Vec<crate::Port> = self.ports.drain(first..=last).collect();
        let (mut reordered, trailing): (Vec<_>, Vec<_>) =
            span.into_iter().partition(|p| is_member(p));
        reordered.extend(trailing);
        for (offset, port) in reordered.into_iter().enumerate() {
            self.ports.insert(first + offset, port);
        }
        self.listener.on_ports_reordered(group_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_strips_separators() {
        assert_eq!(pair_display_name(&["out L", "out R"]), "out");
        assert_eq!(pair_display_name(&["capture_1", "capture_2"]), "capture");
        assert_eq!(pair_display_name(&["main.left", "main.right"]), "main");
    }

    #[test]
    fn display_name_strips_direction_tokens() {
        assert_eq!(pair_display_name(&["Audio In 1", "Audio In 2"]), "Audio");
        assert_eq!(
            pair_display_name(&["monitor_out_l", "monitor_out_r"]),
            "monitor"
        );
    }

    #[test]
    fn display_name_falls_back_when_nothing_common() {
        assert_eq!(pair_display_name(&["Left", "Right"]), "Left");
    }

    #[test]
    fn display_name_never_equals_a_member_name() {
        // The common prefix is the full first name here; trimming must keep
        // going rather than display a member's own name for the pair.
        assert_eq!(pair_display_name(&["Audio In", "Audio In 2"]), "Audio");
    }

    fn model_with_outputs() -> GraphModel {
        use crate::{GroupIcon, MemoryStore, NullListener, NullSink, SplitHint};
        let mut model = GraphModel::new(
            Box::new(MemoryStore::default()),
            Box::new(NullListener),
            Box::new(NullSink),
        );
        model
            .add_group(GroupId(1), "synth", SplitHint::Joined, GroupIcon::Plugin)
            .unwrap();
        for (id, name, port_type) in [
            (1, "out L", PortType::Audio),
            (2, "out R", PortType::Audio),
            (3, "events", PortType::MidiNative),
        ] {
            model
                .add_port(GroupId(1), PortId(id), name, PortMode::Output, port_type, false)
                .unwrap();
        }
        model
    }

    #[test]
    fn create_pair_needs_two_ports() {
        let mut model = model_with_outputs();
        assert_eq!(
            model.create_pair(GroupId(1), PortMode::Output, PortType::Audio, &[PortId(1)]),
            Err(GraphError::PairTooSmall(1))
        );
    }

    #[test]
    fn create_pair_rejects_a_member_of_another_type() {
        let mut model = model_with_outputs();
        assert_eq!(
            model.create_pair(
                GroupId(1),
                PortMode::Output,
                PortType::Audio,
                &[PortId(1), PortId(3)],
            ),
            Err(GraphError::PairMemberMismatch(PortId(3)))
        );
        assert!(model.pairs().is_empty());
    }

    #[test]
    fn create_pair_rejects_an_already_paired_member() {
        let mut model = model_with_outputs();
        let pair_id = model
            .pair_ports(GroupId(1), &[PortId(1), PortId(2)])
            .unwrap();
        assert_eq!(
            model.create_pair(
                GroupId(1),
                PortMode::Output,
                PortType::Audio,
                &[PortId(1), PortId(2)],
            ),
            Err(GraphError::AlreadyPaired(PortId(1), pair_id))
        );
        assert_eq!(model.pairs().len(), 1);
    }
}

//! Roster resolution.
//!
//! Rosters name agents by alias and match raw agent names by substring
//! containment. Containment is loose: `AG001` is contained in `AG0010`, so a
//! domain can silently pick up someone else's presence. Instead of matching
//! ad hoc at every lookup, a `RosterTable` is built once per domain: it
//! records which alias admitted each agent and lists every ambiguous match.

use crate::{
    config::Roster,
    end_time_resolver::ResolvedTimeline,
    types::AgentId,
};
use std::collections::{BTreeMap, BTreeSet};

/// True when the principal-state label contains any keyword,
/// case-insensitively.
pub fn is_in_queue_state(label: &str, keywords: &[String]) -> bool {
    let label = label.to_lowercase();
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .any(|k| label.contains(&k.to_lowercase()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Raw name equals the alias.
    Exact,
    /// Alias is contained in the raw name.
    Substring,
    /// The roster lists no members; every agent passing the filters is in.
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMatch {
    pub alias: Option<String>,
    pub kind:  MatchKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ambiguity {
    /// One raw name contains several aliases. The longest alias is kept.
    AgentMatchesSeveral { agent: AgentId, aliases: Vec<String> },
    /// One alias is contained in several raw names. All of them are kept.
    AliasMatchesSeveral { alias: String, agents: Vec<AgentId> },
}

#[derive(Debug, Clone, Default)]
pub struct RosterTable {
    matches:     BTreeMap<AgentId, RosterMatch>,
    ambiguities: Vec<Ambiguity>,
    unmatched:   Vec<String>,
}

impl RosterTable {
    /// `agents` yields each raw agent name with the divisions seen on its
    /// entries (if the export carries that column).
    pub fn build<'a, I>(roster: &Roster, agents: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a BTreeSet<String>>)>,
    {
        let members: Vec<&str> = non_empty(&roster.members);
        let excluded: Vec<&str> = non_empty(&roster.excluded);
        let division = roster
            .division
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_lowercase);

        let mut table = Self::default();
        let mut by_alias: BTreeMap<&str, Vec<AgentId>> = BTreeMap::new();

        for (agent, divisions) in agents {
            if let Some(wanted) = &division {
                let in_division = divisions
                    .map(|ds| ds.iter().any(|d| d.to_lowercase().contains(wanted.as_str())))
                    .unwrap_or(false);
                if !in_division {
                    continue;
                }
            }
            if excluded.iter().any(|x| agent.contains(*x)) {
                log::debug!("Agent '{agent}' excluded by roster");
                continue;
            }

            if members.is_empty() {
                table.matches.insert(
                    agent.to_string(),
                    RosterMatch { alias: None, kind: MatchKind::Open },
                );
                continue;
            }

            let hits: Vec<&str> = members.iter().copied().filter(|m| agent.contains(*m)).collect();
            if hits.is_empty() {
                continue;
            }
            for &alias in &hits {
                by_alias.entry(alias).or_default().push(agent.to_string());
            }

            let m = if let Some(exact) = hits.iter().find(|m| **m == agent) {
                RosterMatch { alias: Some(exact.to_string()), kind: MatchKind::Exact }
            } else {
                if hits.len() > 1 {
                    log::warn!("Agent '{agent}' matches several roster aliases: {hits:?}");
                    table.ambiguities.push(Ambiguity::AgentMatchesSeveral {
                        agent:   agent.to_string(),
                        aliases: hits.iter().map(|h| h.to_string()).collect(),
                    });
                }
                let longest = hits
                    .iter()
                    .copied()
                    .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
                    .unwrap_or_default();
                RosterMatch { alias: Some(longest.to_string()), kind: MatchKind::Substring }
            };
            table.matches.insert(agent.to_string(), m);
        }

        for alias in &members {
            match by_alias.get(alias) {
                None => table.unmatched.push(alias.to_string()),
                Some(agents) if agents.len() > 1 => {
                    log::warn!("Roster alias '{alias}' matches several agents: {agents:?}");
                    table.ambiguities.push(Ambiguity::AliasMatchesSeveral {
                        alias:  alias.to_string(),
                        agents: agents.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        table
    }

    pub fn for_timeline(roster: &Roster, timeline: &ResolvedTimeline) -> Self {
        Self::build(
            roster,
            timeline.agents().map(|a| (a, timeline.divisions_for(a))),
        )
    }

    pub fn contains(&self, agent: &str) -> bool {
        self.matches.contains_key(agent)
    }

    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.matches.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn match_for(&self, agent: &str) -> Option<&RosterMatch> {
        self.matches.get(agent)
    }

    pub fn alias_for(&self, agent: &str) -> Option<&str> {
        self.matches.get(agent).and_then(|m| m.alias.as_deref())
    }

    pub fn ambiguities(&self) -> &[Ambiguity] {
        &self.ambiguities
    }

    /// Member aliases with no agent in the data.
    pub fn unmatched_members(&self) -> &[String] {
        &self.unmatched
    }
}

fn non_empty(aliases: &[String]) -> Vec<&str> {
    aliases
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect()
}

//! Parser for robots.txt-style access rule files.
//!
//! The format is robots.txt-compatible but repurposed: `User-agent` names an
//! identity (with `*` as the wildcard) rather than a crawler, and
//! `Allow`/`Disallow` lines carry rooted path prefixes. The longest matching
//! prefix in the governing group decides; with nothing matching the default
//! is allow.

/// A single parsed rule file.
#[derive(Debug, Clone, Default)]
pub struct RuleFile {
    groups: Vec<RuleGroup>,
}

#[derive(Debug, Clone, Default)]
struct RuleGroup {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    prefix: String,
}

impl RuleGroup {
    fn governs(&self, principal: &str) -> bool {
        self.agents.iter().any(|a| a == "*" || a.eq_ignore_ascii_case(principal))
    }

    fn is_wildcard_only(&self) -> bool {
        self.agents.iter().all(|a| a == "*")
    }
}

impl RuleFile {
    /// Parse rule-file text. Unknown directives and malformed lines are
    /// skipped, matching the tolerant behavior of robots.txt consumers.
    pub fn parse(text: &str) -> Self {
        let mut groups: Vec<RuleGroup> = Vec::new();
        let mut current = RuleGroup::default();
        // Consecutive User-agent lines share one rule group; a User-agent
        // line after any rule line starts a new group.
        let mut in_agent_header = false;

        for raw_line in text.lines() {
            let line = match raw_line.split_once('#') {
                Some((before, _comment)) => before.trim(),
                None => raw_line.trim(),
            };
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !in_agent_header && !current.rules.is_empty() {
                        groups.push(std::mem::take(&mut current));
                    }
                    current.agents.push(value.to_string());
                    in_agent_header = true;
                }
                "allow" | "disallow" => {
                    in_agent_header = false;
                    if current.agents.is_empty() {
                        // Rule line before any User-agent; nothing to attach to.
                        continue;
                    }
                    // An empty Disallow (or Allow) value matches nothing.
                    if value.is_empty() {
                        continue;
                    }
                    current.rules.push(Rule {
                        allow: key == "allow",
                        prefix: value.to_string(),
                    });
                }
                _ => {}
            }
        }
        if !current.agents.is_empty() {
            groups.push(current);
        }

        Self { groups }
    }

    /// Decide whether `principal` may fetch `path` (a rooted data path,
    /// directories carrying a trailing slash).
    pub fn is_allowed(&self, principal: &str, path: &str) -> bool {
        // A group naming the principal outranks the wildcard group.
        let group = self
            .groups
            .iter()
            .find(|g| g.governs(principal) && !g.is_wildcard_only())
            .or_else(|| self.groups.iter().find(|g| g.governs(principal)));

        let Some(group) = group else {
            return true;
        };

        let mut decision = true;
        let mut matched_len = 0;
        for rule in &group.rules {
            if path.starts_with(&rule.prefix) {
                let len = rule.prefix.len();
                // Longest prefix wins; on a tie Allow wins.
                if len > matched_len || (len == matched_len && rule.allow) {
                    decision = rule.allow;
                    matched_len = len;
                }
            }
        }
        decision
    }
}

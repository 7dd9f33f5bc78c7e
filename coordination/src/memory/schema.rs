//! Tree and key layout for the durable memory store.
//!
//! Each sled tree provides logical separation of row families while sharing
//! one database. Event keys embed a zero-padded nanosecond timestamp so
//! lexicographic iteration yields time order.

/// Tree for keyed, categorized, TTL-aware entries.
pub const TREE_ENTRIES: &str = "entries";

/// Tree for per-workflow memory rows.
pub const TREE_WORKFLOWS: &str = "workflow_memory";

/// Tree for per-agent state snapshots.
pub const TREE_AGENTS: &str = "agent_state";

/// Tree for the append-only coordination event log.
pub const TREE_EVENTS: &str = "events";

/// Key builders for compound keys.
pub mod keys {
    /// Key for a categorized entry; unique per (key, category).
    pub fn entry(category: &str, key: &str) -> String {
        format!("ent:{}:{}", category, key)
    }

    /// Prefix matching every entry in a category.
    pub fn entry_prefix(category: &str) -> String {
        format!("ent:{}:", category)
    }

    /// Key for a workflow memory row.
    pub fn workflow(workflow_id: &str) -> String {
        format!("wf:{}", workflow_id)
    }

    /// Key for an agent snapshot row.
    pub fn agent(agent_id: &str) -> String {
        format!("agent:{}", agent_id)
    }

    /// Key for a coordination event (timestamp-ordered).
    pub fn event(timestamp_nanos: i64, event_id: &str) -> String {
        format!("evt:{:020}:{}", timestamp_nanos, event_id)
    }
}

/// Glob-style key matching supporting `*` (any run) and `?` (any one char).
pub fn glob_match(pattern: &str, input: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = input.chars().collect();

    // Iterative backtracking over the last `*` seen.
    let (mut pi, mut si) = (0usize, 0usize);
    let (mut star, mut mark) = (None::<usize>, 0usize);

    while si < s.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == s[si]) {
            pi += 1;
            si += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = si;
            pi += 1;
        } else if let Some(star_pos) = star {
            pi = star_pos + 1;
            mark += 1;
            si = mark;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        assert_eq!(keys::entry("tasks", "t1"), "ent:tasks:t1");
        assert_eq!(keys::entry_prefix("tasks"), "ent:tasks:");
        assert_eq!(keys::workflow("wf1"), "wf:wf1");
        assert_eq!(keys::agent("a1"), "agent:a1");
    }

    #[test]
    fn test_event_key_ordering() {
        let key1 = keys::event(1_000_000_000, "e1");
        let key2 = keys::event(2_000_000_000, "e2");
        assert!(key1 < key2);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("task_*_result", "task_t1_result"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("task_?", "task_a"));
        assert!(!glob_match("task_?", "task_ab"));
        assert!(!glob_match("task_*_result", "workflow_t1_result"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
    }
}

// src/cycle.rs

//! Circular dependency detection over not-yet-installed distributions
//!
//! Builds a directed graph with an edge A -> B whenever a package required
//! by A is provided by B, then finds strongly connected components. Every
//! distribution sitting on a component of size > 1 (or on a self-loop) is
//! reported with a deterministic cycle path.

use std::collections::{BTreeMap, HashMap, HashSet};

struct Node {
    distfile: String,
    distvname: String,
    provides: Vec<String>,
    requires: Vec<String>,
}

/// Cycle finder; `add` every candidate, `finalize`, then `detect`
#[derive(Default)]
pub struct CycleDetector {
    nodes: Vec<Node>,
    edges: Vec<Vec<usize>>,
    finalized: bool,
}

impl CycleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one distribution with the packages it provides and requires
    pub fn add(
        &mut self,
        distfile: impl Into<String>,
        distvname: impl Into<String>,
        provides: Vec<String>,
        requires: Vec<String>,
    ) {
        self.nodes.push(Node {
            distfile: distfile.into(),
            distvname: distvname.into(),
            provides,
            requires,
        });
        self.finalized = false;
    }

    /// Build the dependency edges
    pub fn finalize(&mut self) {
        let mut provider: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            for p in &node.provides {
                provider.entry(p.as_str()).or_default().push(i);
            }
        }

        self.edges = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let mut targets: HashSet<usize> = HashSet::new();
            for required in &node.requires {
                if let Some(owners) = provider.get(required.as_str()) {
                    targets.extend(owners.iter().copied());
                }
            }
            let mut targets: Vec<usize> = targets.into_iter().collect();
            // Deterministic successor order for path reporting.
            targets.sort_by(|&a, &b| {
                (&self.nodes[a].distvname, &self.nodes[a].distfile)
                    .cmp(&(&self.nodes[b].distvname, &self.nodes[b].distfile))
            });
            self.edges[i] = targets;
        }
        self.finalized = true;
    }

    /// Map every distribution on a cycle to its cycle path of distvnames
    ///
    /// The path starts at the lexicographically smallest distvname of the
    /// component and closes back on itself: `["A", "B", "A"]`.
    pub fn detect(&self) -> BTreeMap<String, Vec<String>> {
        assert!(self.finalized, "finalize() must run before detect()");

        let mut report = BTreeMap::new();
        for component in self.strongly_connected_components() {
            let members: HashSet<usize> = component.iter().copied().collect();
            let cyclic = component.len() > 1
                || component
                    .iter()
                    .any(|&i| self.edges[i].contains(&i));
            if !cyclic {
                continue;
            }

            let start = component
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    (&self.nodes[a].distvname, &self.nodes[a].distfile)
                        .cmp(&(&self.nodes[b].distvname, &self.nodes[b].distfile))
                })
                .expect("non-empty component");
            let path = self.cycle_path(start, &members);
            let names: Vec<String> = path
                .iter()
                .map(|&i| self.nodes[i].distvname.clone())
                .collect();

            for &i in &component {
                report.insert(self.nodes[i].distfile.clone(), names.clone());
            }
        }
        report
    }

    /// Tarjan's algorithm, iterative to keep deep graphs off the call stack
    fn strongly_connected_components(&self) -> Vec<Vec<usize>> {
        let n = self.nodes.len();
        let mut index = vec![usize::MAX; n];
        let mut lowlink = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut next_index = 0usize;
        let mut components = Vec::new();

        // Explicit DFS frames: (node, next-successor position)
        for root in 0..n {
            if index[root] != usize::MAX {
                continue;
            }
            let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
            while let Some(&(v, pos)) = frames.last() {
                if index[v] == usize::MAX {
                    index[v] = next_index;
                    lowlink[v] = next_index;
                    next_index += 1;
                    stack.push(v);
                    on_stack[v] = true;
                }
                if let Some(&w) = self.edges[v].get(pos) {
                    frames.last_mut().expect("frame just read").1 += 1;
                    if index[w] == usize::MAX {
                        frames.push((w, 0));
                    } else if on_stack[w] {
                        lowlink[v] = lowlink[v].min(index[w]);
                    }
                } else {
                    frames.pop();
                    if let Some(&(parent, _)) = frames.last() {
                        lowlink[parent] = lowlink[parent].min(lowlink[v]);
                    }
                    if lowlink[v] == index[v] {
                        let mut component = Vec::new();
                        loop {
                            let w = stack.pop().expect("tarjan stack underflow");
                            on_stack[w] = false;
                            component.push(w);
                            if w == v {
                                break;
                            }
                        }
                        components.push(component);
                    }
                }
            }
        }
        components
    }

    /// A concrete path start -> ... -> start inside one component
    fn cycle_path(&self, start: usize, members: &HashSet<usize>) -> Vec<usize> {
        let mut path = vec![start];
        let mut visited = HashSet::new();
        visited.insert(start);
        if self.walk(start, start, members, &mut visited, &mut path) {
            return path;
        }
        // Unreachable for a genuine SCC; keep the report well-formed anyway.
        vec![start, start]
    }

    fn walk(
        &self,
        current: usize,
        start: usize,
        members: &HashSet<usize>,
        visited: &mut HashSet<usize>,
        path: &mut Vec<usize>,
    ) -> bool {
        for &next in &self.edges[current] {
            if !members.contains(&next) {
                continue;
            }
            if next == start {
                path.push(start);
                return true;
            }
            if visited.insert(next) {
                path.push(next);
                if self.walk(next, start, members, visited, path) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(entries: &[(&str, &[&str], &[&str])]) -> CycleDetector {
        let mut d = CycleDetector::new();
        for (name, provides, requires) in entries {
            d.add(
                format!("{}.tar.gz", name),
                name.to_string(),
                provides.iter().map(|s| s.to_string()).collect(),
                requires.iter().map(|s| s.to_string()).collect(),
            );
        }
        d.finalize();
        d
    }

    #[test]
    fn test_no_cycle() {
        let d = detector(&[
            ("A-1.0", &["A"], &["B"]),
            ("B-1.0", &["B"], &[]),
        ]);
        assert!(d.detect().is_empty());
    }

    #[test]
    fn test_two_node_cycle() {
        let d = detector(&[
            ("B-1.0", &["B"], &["A"]),
            ("A-1.0", &["A"], &["B"]),
        ]);
        let report = d.detect();

        assert_eq!(report.len(), 2);
        let path = report.get("A-1.0.tar.gz").unwrap();
        assert_eq!(path, &["A-1.0", "B-1.0", "A-1.0"]);
        assert_eq!(report.get("B-1.0.tar.gz").unwrap(), path);
    }

    #[test]
    fn test_self_loop() {
        let d = detector(&[("A-1.0", &["A", "A.Helper"], &["A.Helper"])]);
        let report = d.detect();
        assert_eq!(
            report.get("A-1.0.tar.gz").unwrap(),
            &["A-1.0", "A-1.0"]
        );
    }

    #[test]
    fn test_three_node_cycle_starts_at_lex_min() {
        let d = detector(&[
            ("C-1.0", &["C"], &["A"]),
            ("A-1.0", &["A"], &["B"]),
            ("B-1.0", &["B"], &["C"]),
        ]);
        let report = d.detect();
        assert_eq!(report.len(), 3);
        let path = report.get("B-1.0.tar.gz").unwrap();
        assert_eq!(path, &["A-1.0", "B-1.0", "C-1.0", "A-1.0"]);
    }

    #[test]
    fn test_chain_into_cycle_reports_only_cycle_members() {
        let d = detector(&[
            ("Outside-1.0", &["Outside"], &["A"]),
            ("A-1.0", &["A"], &["B"]),
            ("B-1.0", &["B"], &["A"]),
        ]);
        let report = d.detect();
        assert_eq!(report.len(), 2);
        assert!(!report.contains_key("Outside-1.0.tar.gz"));
    }

    #[test]
    fn test_detect_is_deterministic() {
        let build = || {
            detector(&[
                ("B-1.0", &["B"], &["A", "C"]),
                ("C-1.0", &["C"], &["B"]),
                ("A-1.0", &["A"], &["B"]),
            ])
            .detect()
        };
        assert_eq!(build(), build());
    }
}

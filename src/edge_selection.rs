/// A module containing the local edge selection of the dynamic program.
/// Given the residual degrees a bag has to realise with its own internal
/// edges, it enumerates edge subsets by a take/skip recursion over the
/// cost-sorted edge list and keeps the cheapest subset that, together with
/// the path fragments already committed to the children, forms a valid set
/// of vertex-disjoint simple paths (or, at the root, one closed tour).
pub mod edge_selection {
    use std::collections::HashMap;

    use crate::graph_structures::graph_model::{Cost, Edge, Vertex, INFINITY};
    use crate::states::state_codec::canonicalize;

    /// Finds the cheapest subset of the bag-internal edges that satisfies
    /// the residual degrees exactly.
    ///
    /// `edges` must be sorted ascending by (cost, min-id, max-id);
    /// `residual_degrees[i]` is the degree still owed by `contents[i]`;
    /// `endpoints` are the pairs the paths of this subtree must terminate
    /// at; `child_paths` are the endpoint pairs already delegated to child
    /// bags, treated as virtual fragments during validation. With
    /// `allow_cycle` (root bag, no endpoints) the committed fragments must
    /// close into a single covering cycle instead.
    ///
    /// Returns the minimum cost, INFINITY if no subset works, and the chosen
    /// edges when `want_edges` is set. Among equal-cost subsets the
    /// lexicographically smallest edge list by (min-id, max-id) sequence is
    /// returned.
    pub fn edge_select(
        contents: &[Vertex],
        edges: &[Edge],
        residual_degrees: &[u8],
        endpoints: &[(Vertex, Vertex)],
        child_paths: &[(Vertex, Vertex)],
        allow_cycle: bool,
        want_edges: bool,
    ) -> (Cost, Option<Vec<Edge>>) {
        debug_assert_eq!(contents.len(), residual_degrees.len());
        let mut degrees: Vec<i8> = residual_degrees.iter().map(|&d| d as i8).collect();
        let mut chosen = vec![];
        select(
            contents,
            edges,
            0,
            &mut degrees,
            &mut chosen,
            endpoints,
            child_paths,
            allow_cycle,
            want_edges,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn select(
        contents: &[Vertex],
        edges: &[Edge],
        index: usize,
        degrees: &mut [i8],
        chosen: &mut Vec<Edge>,
        endpoints: &[(Vertex, Vertex)],
        child_paths: &[(Vertex, Vertex)],
        allow_cycle: bool,
        want_edges: bool,
    ) -> (Cost, Option<Vec<Edge>>) {
        // Base case 1: all residuals are satisfied; no further edge may be
        // added, so validate what was committed.
        if degrees.iter().all(|&d| d == 0) {
            let mut fragments: Vec<(Vertex, Vertex)> =
                chosen.iter().map(|e| (e.a, e.b)).collect();
            fragments.extend_from_slice(child_paths);
            return if fragments_form_paths(&fragments, endpoints, allow_cycle) {
                (0, want_edges.then(|| chosen.clone()))
            } else {
                (INFINITY, None)
            };
        }
        // Base case 2: degrees remain but the edge list is exhausted.
        if index == edges.len() {
            return (INFINITY, None);
        }

        let edge = edges[index];
        let ia = contents.iter().position(|&v| v == edge.a).unwrap();
        let ib = contents.iter().position(|&v| v == edge.b).unwrap();

        // Take the edge, unless that would overdraw a residual.
        let take = if degrees[ia] > 0 && degrees[ib] > 0 {
            degrees[ia] -= 1;
            degrees[ib] -= 1;
            chosen.push(edge);
            let (sub, list) = select(
                contents, edges, index + 1, degrees, chosen, endpoints, child_paths, allow_cycle,
                want_edges,
            );
            chosen.pop();
            degrees[ia] += 1;
            degrees[ib] += 1;
            (sub.saturating_add(edge.cost), list)
        } else {
            (INFINITY, None)
        };

        let skip = select(
            contents, edges, index + 1, degrees, chosen, endpoints, child_paths, allow_cycle,
            want_edges,
        );

        prefer(take, skip)
    }

    /// Keeps the cheaper alternative; on equal cost the lexicographically
    /// smaller edge list wins, which makes reconstructed tours reproducible.
    fn prefer(
        x: (Cost, Option<Vec<Edge>>),
        y: (Cost, Option<Vec<Edge>>),
    ) -> (Cost, Option<Vec<Edge>>) {
        if x.0 < y.0 {
            return x;
        }
        if y.0 < x.0 {
            return y;
        }
        match (&x.1, &y.1) {
            (Some(a), Some(b)) => {
                let ka: Vec<_> = a.iter().map(Edge::key).collect();
                let kb: Vec<_> = b.iter().map(Edge::key).collect();
                if ka <= kb {
                    x
                } else {
                    y
                }
            }
            (None, Some(_)) => y,
            _ => x,
        }
    }

    /// Checks that the given fragments (local edges plus virtual child
    /// paths) form vertex-disjoint simple paths whose end pairs are exactly
    /// `endpoints`. With `allow_cycle` and no endpoints the fragments must
    /// instead close into a single cycle covering all of them. The check is
    /// pure; it never reorders its inputs.
    pub fn fragments_form_paths(
        fragments: &[(Vertex, Vertex)],
        endpoints: &[(Vertex, Vertex)],
        allow_cycle: bool,
    ) -> bool {
        let mut adjacency: HashMap<Vertex, Vec<(Vertex, usize)>> = HashMap::new();
        for (i, &(u, v)) in fragments.iter().enumerate() {
            if u == v {
                return false;
            }
            adjacency.entry(u).or_default().push((v, i));
            adjacency.entry(v).or_default().push((u, i));
        }
        // more than two fragments at one vertex can never untangle into
        // simple paths or a tour
        if adjacency.values().any(|n| n.len() > 2) {
            return false;
        }

        if allow_cycle && endpoints.is_empty() {
            return single_covering_cycle(fragments, &adjacency);
        }

        let mut used = vec![false; fragments.len()];
        let mut found_ends = vec![];

        // every path has two vertices of fragment-degree one; walk from the
        // lower-id end of each and record where the walk stops
        let mut starts: Vec<Vertex> = adjacency
            .iter()
            .filter(|(_, n)| n.len() == 1)
            .map(|(&v, _)| v)
            .collect();
        starts.sort_by_key(|v| v.index());

        for &start in &starts {
            let (mut current, first) = adjacency[&start][0];
            if used[first] {
                continue; // already walked from the opposite end
            }
            used[first] = true;
            while let Some(&(next, i)) = adjacency[&current].iter().find(|&&(_, i)| !used[i]) {
                used[i] = true;
                current = next;
            }
            found_ends.push((start, current));
        }

        // fragments not reached from any path end lie on a cycle, which is
        // premature here
        if used.iter().any(|&u| !u) {
            return false;
        }

        canonicalize(&found_ends) == canonicalize(endpoints)
    }

    /// All fragments on one closed walk: every touched vertex has fragment
    /// degree two and a walk from the first fragment consumes everything.
    fn single_covering_cycle(
        fragments: &[(Vertex, Vertex)],
        adjacency: &HashMap<Vertex, Vec<(Vertex, usize)>>,
    ) -> bool {
        if fragments.is_empty() {
            return false;
        }
        if adjacency.values().any(|n| n.len() != 2) {
            return false;
        }
        let start = fragments[0].0;
        let mut used = vec![false; fragments.len()];
        let mut current = start;
        let mut consumed = 0;
        while let Some(&(next, i)) = adjacency[&current].iter().find(|&&(_, i)| !used[i]) {
            used[i] = true;
            consumed += 1;
            current = next;
        }
        consumed == fragments.len() && current == start
    }
}

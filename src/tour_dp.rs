/// A module containing the dynamic program that computes a cheapest
/// Hamiltonian cycle over a tree decomposition. Per bag and per state
/// (degree vector plus endpoint pairing) the table holds the cheapest way
/// the subtree below the bag can realise that state; the distributor
/// enumerates all ways of splitting the degree targets between local edges
/// and the child bags. A second pass retraces the minimising choices and
/// collects the tour edges.
pub mod tour_dp {
    use std::collections::HashMap;

    use log::{debug, info, trace};

    use crate::edge_selection::edge_selection::edge_select;
    use crate::graph_structures::graph_model::{Cost, Edge, Graph, Vertex, INFINITY};
    use crate::states::state_codec::State;
    use crate::tree_decompositions::decomposition::{BagId, Decomposition};
    use crate::tree_decompositions::tree_structure::TreeStructure;

    /// Structural failures surfaced before or while rooting the
    /// decomposition. "No tour" is deliberately not among them; it is
    /// reported as a solution of cost INFINITY.
    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum SolveError {
        #[error("invalid decomposition: {0}")]
        InvalidDecomposition(String),
        #[error("bag {bag} references vertex {vertex}, which the graph does not have")]
        VertexOutOfRange { bag: BagId, vertex: usize },
        #[error("bag {bag} has width {found}, the limit is {limit}")]
        WidthExceeded {
            bag: BagId,
            limit: usize,
            found: usize,
        },
    }

    /// Knobs of the driver: which bag to root the decomposition at (bag 0
    /// if none) and the largest bag width the solver agrees to process.
    #[derive(Debug, Clone)]
    pub struct SolveOptions {
        pub root: Option<BagId>,
        pub width_limit: usize,
    }

    impl Default for SolveOptions {
        fn default() -> SolveOptions {
            SolveOptions {
                root: None,
                width_limit: 12,
            }
        }
    }

    /// The result of a solver run. cost == INFINITY means the graph has no
    /// Hamiltonian cycle (respecting the decomposition); the edge list is
    /// empty then. Otherwise the edges are the tour, deduplicated, lower
    /// vertex id first, sorted by (min-id, max-id).
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Solution {
        pub cost: Cost,
        pub edges: Vec<(Vertex, Vertex)>,
    }

    impl Solution {
        pub fn is_tour(&self) -> bool {
            self.cost != INFINITY
        }
    }

    /// A struct containing all data of the dynamic program: the per-bag
    /// tables, the rooted decomposition and the cost-sorted internal edge
    /// list of every bag, precomputed once.
    pub struct DpData<'a> {
        table: HashMap<BagId, HashMap<State, Cost>>,
        decomposition: &'a Decomposition,
        tree: &'a TreeStructure,
        sorted_edges: HashMap<BagId, Vec<Edge>>,
    }

    impl<'a> DpData<'a> {
        /// Sets up empty tables and sorts the internal edges of every bag.
        pub fn new(
            graph: &Graph,
            decomposition: &'a Decomposition,
            tree: &'a TreeStructure,
        ) -> DpData<'a> {
            let mut sorted_edges = HashMap::new();
            for (p, bag) in decomposition.bags() {
                sorted_edges.insert(p, graph.edges_within(bag.contents()));
            }
            DpData {
                table: HashMap::new(),
                decomposition,
                tree,
                sorted_edges,
            }
        }

        /// The number of (bag, state) entries computed so far.
        pub fn state_count(&self) -> usize {
            self.table.values().map(HashMap::len).sum()
        }

        /// Returns the cheapest cost at which the subtree rooted at bag p
        /// can realise the given state, computing and memoising it on first
        /// demand.
        pub fn table_query(&mut self, p: BagId, state: &State) -> Cost {
            if let Some(&cost) = self.table.get(&p).and_then(|t| t.get(state)) {
                return cost;
            }

            let edges = self.sorted_edges.get(&p).unwrap().clone();
            let degrees = state.decode_degrees();
            let child_count = self.tree.children(p).len();
            let child_degrees = vec![vec![0u8; degrees.len()]; child_count];
            let child_endpoints = vec![vec![]; child_count];

            let cost = self.distribute_cost(
                p,
                &edges,
                0,
                0,
                &degrees,
                &child_degrees,
                state.endpoints(),
                &child_endpoints,
            );
            trace!("bag {}: {:?} -> {}", p, state, cost);
            self.table.entry(p).or_default().insert(state.clone(), cost);
            cost
        }

        /// The distributor of the value pass. Walks the bag vertices (index
        /// i) and the children (index j) and assigns every degree unit of
        /// vertex i either to the local edge selection or to a child whose
        /// bag contains the vertex; complete assignments are costed by
        /// evaluate and the minimum is kept.
        #[allow(clippy::too_many_arguments)]
        fn distribute_cost(
            &mut self,
            p: BagId,
            edges: &[Edge],
            i: usize,
            j: usize,
            target: &[u8],
            child_degrees: &[Vec<u8>],
            endpoints: &[(Vertex, Vertex)],
            child_endpoints: &[Vec<(Vertex, Vertex)>],
        ) -> Cost {
            let decomposition = self.decomposition;
            let tree = self.tree;
            let contents = decomposition.bag(p).unwrap().contents();
            let children = tree.children(p);

            // all vertices processed: the split is complete
            if i == contents.len() {
                return self.evaluate(p, edges, target, child_degrees, endpoints, child_endpoints);
            }
            // nothing (left) to assign at this vertex, or no children left
            if target[i] == 0 || j == children.len() {
                return self.distribute_cost(
                    p,
                    edges,
                    i + 1,
                    0,
                    target,
                    child_degrees,
                    endpoints,
                    child_endpoints,
                );
            }
            let c = children[j];
            let c_contents = decomposition.bag(c).unwrap().contents();
            if !c_contents.contains(&contents[i]) {
                return self.distribute_cost(
                    p,
                    edges,
                    i,
                    j + 1,
                    target,
                    child_degrees,
                    endpoints,
                    child_endpoints,
                );
            }

            let mut result = INFINITY;

            // hand both degree units over: the vertex is then interior to a
            // path of the child's subtree
            if target[i] == 2 && child_degrees[j][i] == 0 {
                let mut td = target.to_vec();
                let mut cds = child_degrees.to_vec();
                td[i] = 0;
                cds[j][i] = 2;
                result = self.distribute_cost(p, edges, i + 1, 0, &td, &cds, endpoints, child_endpoints);
            }

            // hand one unit over, paired with a later bag vertex: the child
            // subtree must then produce an open path between the two. Each
            // vertex may anchor at most one such path per child.
            for m in (i + 1)..contents.len() {
                if target[m] == 0 || child_degrees[j][m] > 1 || !c_contents.contains(&contents[m]) {
                    continue;
                }
                if endpoint_occupied(&child_endpoints[j], contents[i])
                    || endpoint_occupied(&child_endpoints[j], contents[m])
                {
                    continue;
                }
                let mut td = target.to_vec();
                let mut cds = child_degrees.to_vec();
                let mut ceps = child_endpoints.to_vec();
                td[i] -= 1;
                td[m] -= 1;
                cds[j][i] += 1;
                cds[j][m] += 1;
                ceps[j].push((contents[i], contents[m]));
                // vertex i may still owe a unit, so stay at (i, j)
                result = result.min(self.distribute_cost(p, edges, i, j, &td, &cds, endpoints, &ceps));
            }

            // or leave the unit to the local edges or a later child
            result.min(self.distribute_cost(
                p,
                edges,
                i,
                j + 1,
                target,
                child_degrees,
                endpoints,
                child_endpoints,
            ))
        }

        /// Costs one complete split: the local edge selection for the
        /// degrees kept in the bag plus the table values of the child states
        /// induced by the delegated degrees.
        fn evaluate(
            &mut self,
            p: BagId,
            edges: &[Edge],
            target: &[u8],
            child_degrees: &[Vec<u8>],
            endpoints: &[(Vertex, Vertex)],
            child_endpoints: &[Vec<(Vertex, Vertex)>],
        ) -> Cost {
            let decomposition = self.decomposition;
            let tree = self.tree;
            let at_root = tree.parent(p).is_none();
            // a non-root subtree must hand at least one open path up,
            // otherwise it cannot take part in the tour
            if !at_root && endpoints.is_empty() {
                return INFINITY;
            }

            let contents = decomposition.bag(p).unwrap().contents();
            let flat: Vec<(Vertex, Vertex)> =
                child_endpoints.iter().flatten().copied().collect();
            let (local, _) = edge_select(
                contents,
                edges,
                target,
                endpoints,
                &flat,
                at_root && endpoints.is_empty(),
                false,
            );
            if local == INFINITY {
                return INFINITY;
            }

            let mut total = local;
            let children = tree.children(p);
            for (j, &c) in children.iter().enumerate() {
                let child_state = self.child_state(p, c, &child_degrees[j], &child_endpoints[j]);
                let sub = self.table_query(c, &child_state);
                if sub == INFINITY {
                    return INFINITY;
                }
                total = total.saturating_add(sub);
            }
            total
        }

        /// The state a child is asked to realise: delegated degrees for the
        /// vertices shared with this bag, full degree 2 for the vertices
        /// private to the child's subtree, and the endpoint pairs committed
        /// to that child.
        fn child_state(
            &self,
            p: BagId,
            c: BagId,
            delegated: &[u8],
            endpoints: &[(Vertex, Vertex)],
        ) -> State {
            let contents = self.decomposition.bag(p).unwrap().contents();
            let kid_contents = self.decomposition.bag(c).unwrap().contents();
            let mut kid_degrees = vec![2u8; kid_contents.len()];
            for (pi, v) in kid_contents.iter().enumerate() {
                for (q, w) in contents.iter().enumerate() {
                    if v == w {
                        kid_degrees[pi] = delegated[q];
                    }
                }
            }
            State::encode(&kid_degrees, endpoints)
        }

        /// The reconstruction pass: re-runs the distributor for the state
        /// and accepts the first split whose recomputed cost equals the
        /// memoised value, returning the union of the local edge selection
        /// and the recursively reconstructed child tours. The result may
        /// mention an edge more than once; the driver deduplicates.
        pub fn reconstruct(&mut self, p: BagId, state: &State) -> Vec<Edge> {
            let expected = self.table_query(p, state);
            if expected == INFINITY {
                return vec![];
            }
            let edges = self.sorted_edges.get(&p).unwrap().clone();
            let degrees = state.decode_degrees();
            let child_count = self.tree.children(p).len();
            let child_degrees = vec![vec![0u8; degrees.len()]; child_count];
            let child_endpoints = vec![vec![]; child_count];

            self.distribute_tour(
                p,
                &edges,
                0,
                0,
                &degrees,
                &child_degrees,
                state.endpoints(),
                &child_endpoints,
                expected,
            )
            .unwrap_or_default()
        }

        /// The distributor of the reconstruction pass. Identical enumeration
        /// to distribute_cost, but the base case only accepts the split that
        /// reproduces the expected cost, and the first accepted split wins.
        #[allow(clippy::too_many_arguments)]
        fn distribute_tour(
            &mut self,
            p: BagId,
            edges: &[Edge],
            i: usize,
            j: usize,
            target: &[u8],
            child_degrees: &[Vec<u8>],
            endpoints: &[(Vertex, Vertex)],
            child_endpoints: &[Vec<(Vertex, Vertex)>],
            expected: Cost,
        ) -> Option<Vec<Edge>> {
            let decomposition = self.decomposition;
            let tree = self.tree;
            let contents = decomposition.bag(p).unwrap().contents();
            let children = tree.children(p);

            if i == contents.len() {
                return self.lookup_back(p, edges, target, child_degrees, endpoints, child_endpoints, expected);
            }
            if target[i] == 0 || j == children.len() {
                return self.distribute_tour(
                    p,
                    edges,
                    i + 1,
                    0,
                    target,
                    child_degrees,
                    endpoints,
                    child_endpoints,
                    expected,
                );
            }
            let c = children[j];
            let c_contents = decomposition.bag(c).unwrap().contents();
            if !c_contents.contains(&contents[i]) {
                return self.distribute_tour(
                    p,
                    edges,
                    i,
                    j + 1,
                    target,
                    child_degrees,
                    endpoints,
                    child_endpoints,
                    expected,
                );
            }

            if target[i] == 2 && child_degrees[j][i] == 0 {
                let mut td = target.to_vec();
                let mut cds = child_degrees.to_vec();
                td[i] = 0;
                cds[j][i] = 2;
                if let Some(tour) =
                    self.distribute_tour(p, edges, i + 1, 0, &td, &cds, endpoints, child_endpoints, expected)
                {
                    return Some(tour);
                }
            }

            for m in (i + 1)..contents.len() {
                if target[m] == 0 || child_degrees[j][m] > 1 || !c_contents.contains(&contents[m]) {
                    continue;
                }
                if endpoint_occupied(&child_endpoints[j], contents[i])
                    || endpoint_occupied(&child_endpoints[j], contents[m])
                {
                    continue;
                }
                let mut td = target.to_vec();
                let mut cds = child_degrees.to_vec();
                let mut ceps = child_endpoints.to_vec();
                td[i] -= 1;
                td[m] -= 1;
                cds[j][i] += 1;
                cds[j][m] += 1;
                ceps[j].push((contents[i], contents[m]));
                if let Some(tour) =
                    self.distribute_tour(p, edges, i, j, &td, &cds, endpoints, &ceps, expected)
                {
                    return Some(tour);
                }
            }

            self.distribute_tour(
                p,
                edges,
                i,
                j + 1,
                target,
                child_degrees,
                endpoints,
                child_endpoints,
                expected,
            )
        }

        /// Recomputes one complete split and, if it meets the expected cost,
        /// assembles its edge list: the local selection (now in
        /// list-producing mode) plus the reconstructed child tours.
        #[allow(clippy::too_many_arguments)]
        fn lookup_back(
            &mut self,
            p: BagId,
            edges: &[Edge],
            target: &[u8],
            child_degrees: &[Vec<u8>],
            endpoints: &[(Vertex, Vertex)],
            child_endpoints: &[Vec<(Vertex, Vertex)>],
            expected: Cost,
        ) -> Option<Vec<Edge>> {
            let decomposition = self.decomposition;
            let tree = self.tree;
            let at_root = tree.parent(p).is_none();
            if !at_root && endpoints.is_empty() {
                return None;
            }

            let contents = decomposition.bag(p).unwrap().contents();
            let flat: Vec<(Vertex, Vertex)> =
                child_endpoints.iter().flatten().copied().collect();
            let (local, chosen) = edge_select(
                contents,
                edges,
                target,
                endpoints,
                &flat,
                at_root && endpoints.is_empty(),
                true,
            );
            if local == INFINITY {
                return None;
            }

            let mut total = local;
            let children = tree.children(p);
            let mut child_states = Vec::with_capacity(children.len());
            for (j, &c) in children.iter().enumerate() {
                let child_state = self.child_state(p, c, &child_degrees[j], &child_endpoints[j]);
                let sub = self.table_query(c, &child_state);
                if sub == INFINITY {
                    return None;
                }
                total = total.saturating_add(sub);
                child_states.push((c, child_state));
            }
            // only the split that reproduces the memoised optimum is the one
            // the value pass settled on
            if total != expected {
                return None;
            }

            let mut result = chosen.unwrap_or_default();
            for (c, child_state) in child_states {
                result.extend(self.reconstruct(c, &child_state));
            }
            Some(result)
        }
    }

    /// Whether the vertex already anchors one of the endpoint pairs.
    fn endpoint_occupied(pairs: &[(Vertex, Vertex)], v: Vertex) -> bool {
        pairs.iter().any(|&(a, b)| a == v || b == v)
    }

    /// Computes a cheapest Hamiltonian cycle of the graph by dynamic
    /// programming over the decomposition. Returns the minimum cost and the
    /// tour edges, or a solution of cost INFINITY when no tour exists.
    pub fn solve(
        graph: &Graph,
        decomposition: &Decomposition,
        options: &SolveOptions,
    ) -> Result<Solution, SolveError> {
        decomposition.validate(graph, options.width_limit)?;
        let tree = TreeStructure::root_at(decomposition, options.root)?;

        // a simple graph has no closed tour over fewer than three vertices
        if graph.vertex_count() < 3 {
            return Ok(Solution {
                cost: INFINITY,
                edges: vec![],
            });
        }

        let root = tree.root();
        let k_root = decomposition.bag(root).unwrap().contents().len();
        let root_state = State::encode(&vec![2; k_root], &[]);

        let mut dp = DpData::new(graph, decomposition, &tree);
        let cost = dp.table_query(root, &root_state);
        debug!(
            "value pass done: {} table entries over {} bags",
            dp.state_count(),
            decomposition.bag_count()
        );

        if cost == INFINITY {
            info!("no Hamiltonian cycle satisfying the decomposition");
            return Ok(Solution {
                cost: INFINITY,
                edges: vec![],
            });
        }

        let mut edges: Vec<(Vertex, Vertex)> = dp
            .reconstruct(root, &root_state)
            .iter()
            .map(|e| (e.a, e.b))
            .collect();
        edges.sort_by_key(|&(a, b)| (a.index(), b.index()));
        edges.dedup();
        info!("tour of cost {} using {} edges", cost, edges.len());

        Ok(Solution { cost, edges })
    }
}

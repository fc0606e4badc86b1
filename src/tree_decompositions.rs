/// A module containing the tree decomposition handed to the solver: bags of
/// original-graph vertices connected by undirected decomposition edges.
/// The decomposition is built up front and stays immutable while the
/// dynamic program runs; the rooted view lives in the tree_structure module.
pub mod decomposition {
    use crate::graph_structures::graph_model::{Graph, Pos, Vertex};
    use crate::tour_dp::tour_dp::SolveError;

    /// Bags of the decomposition tree, numbered densely from 0 to N-1.
    pub type BagId = u64;

    /// A bag: an ordered list of original-graph vertex ids plus its
    /// neighbours in the decomposition tree. The order of the contents is
    /// significant, it defines the per-bag index the degree vectors of the
    /// dynamic program are written in.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Bag {
        contents: Vec<Vertex>,
        pos: Option<Pos>,
        neighbours: Vec<BagId>,
    }

    impl Bag {
        pub fn contents(&self) -> &[Vertex] {
            &self.contents
        }

        pub fn pos(&self) -> Option<Pos> {
            self.pos
        }

        pub fn neighbours(&self) -> &[BagId] {
            &self.neighbours
        }
    }

    /// A tree decomposition before rooting: just the bags and the edges
    /// between them.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Decomposition {
        bags: Vec<Bag>,
    }

    impl Decomposition {
        pub fn new() -> Decomposition {
            Decomposition { bags: vec![] }
        }

        /// Adds a bag and returns its id. Repeated vertices in the contents
        /// are dropped, keeping the first occurrence.
        pub fn add_bag(&mut self, contents: Vec<Vertex>, pos: Option<Pos>) -> BagId {
            let mut unique = Vec::with_capacity(contents.len());
            for v in contents {
                if !unique.contains(&v) {
                    unique.push(v);
                }
            }
            self.bags.push(Bag {
                contents: unique,
                pos,
                neighbours: vec![],
            });
            (self.bags.len() - 1) as BagId
        }

        /// Inserts an undirected decomposition edge. Loops, unknown bag ids
        /// and duplicate edges are ignored. Returns whether the edge was
        /// inserted.
        pub fn add_bag_edge(&mut self, p: BagId, q: BagId) -> bool {
            let n = self.bags.len() as BagId;
            if p == q || p >= n || q >= n {
                return false;
            }
            if self.bags[p as usize].neighbours.contains(&q) {
                return false;
            }
            self.bags[p as usize].neighbours.push(q);
            self.bags[q as usize].neighbours.push(p);
            true
        }

        pub fn bag(&self, p: BagId) -> Option<&Bag> {
            self.bags.get(p as usize)
        }

        pub fn bag_count(&self) -> usize {
            self.bags.len()
        }

        pub fn bags(&self) -> impl Iterator<Item = (BagId, &Bag)> {
            self.bags.iter().enumerate().map(|(i, b)| (i as BagId, b))
        }

        /// The width of the decomposition, one less than the size of the
        /// largest bag.
        pub fn width(&self) -> usize {
            self.bags
                .iter()
                .map(|b| b.contents.len().saturating_sub(1))
                .max()
                .unwrap_or(0)
        }

        /// Checks the decomposition against the graph it decomposes: every
        /// bag content must be a vertex of the graph, every graph vertex must
        /// appear in some bag, and no bag may exceed the width limit.
        pub fn validate(&self, graph: &Graph, width_limit: usize) -> Result<(), SolveError> {
            let n = graph.vertex_count();
            let mut covered = vec![false; n];
            for (p, bag) in self.bags() {
                for &v in bag.contents() {
                    if v.index() >= n {
                        return Err(SolveError::VertexOutOfRange {
                            bag: p,
                            vertex: v.index(),
                        });
                    }
                    covered[v.index()] = true;
                }
                let found = bag.contents().len().saturating_sub(1);
                if found > width_limit {
                    return Err(SolveError::WidthExceeded {
                        bag: p,
                        limit: width_limit,
                        found,
                    });
                }
            }
            if let Some(v) = covered.iter().position(|&c| !c) {
                return Err(SolveError::InvalidDecomposition(format!(
                    "vertex {} is not contained in any bag",
                    v
                )));
            }
            Ok(())
        }
    }
}

/// A module containing the rooted view of a decomposition: parent pointers
/// and child lists derived from the bag neighbourhoods by one search from
/// the chosen root.
pub mod tree_structure {
    use std::collections::{HashMap, VecDeque};

    use crate::tour_dp::tour_dp::SolveError;
    use crate::tree_decompositions::decomposition::{BagId, Decomposition};

    /// The rooted decomposition tree. Every bag except the root has exactly
    /// one parent; child lists keep the neighbour order of the bags so that
    /// the enumeration order of the dynamic program is reproducible.
    #[derive(Debug, Clone, PartialEq)]
    pub struct TreeStructure {
        root: BagId,
        parents_list: HashMap<BagId, BagId>,
        children_list: HashMap<BagId, Vec<BagId>>,
    }

    impl TreeStructure {
        /// Roots the decomposition at the given bag (bag 0 if none is given)
        /// by a breadth first search over the bag neighbourhoods. Fails if
        /// the decomposition is empty, contains a cycle, or is disconnected.
        pub fn root_at(
            decomposition: &Decomposition,
            root: Option<BagId>,
        ) -> Result<TreeStructure, SolveError> {
            let n = decomposition.bag_count();
            if n == 0 {
                return Err(SolveError::InvalidDecomposition(
                    "decomposition has no bags".to_string(),
                ));
            }
            let root = root.unwrap_or(0);
            if root as usize >= n {
                return Err(SolveError::InvalidDecomposition(format!(
                    "root bag {} does not exist",
                    root
                )));
            }

            let mut parents_list = HashMap::new();
            let mut children_list: HashMap<BagId, Vec<BagId>> = HashMap::new();
            let mut seen = vec![false; n];
            let mut queue = VecDeque::from([root]);
            seen[root as usize] = true;
            let mut visited = 1;

            while let Some(p) = queue.pop_front() {
                let parent = parents_list.get(&p).copied();
                for &q in decomposition.bag(p).unwrap().neighbours() {
                    if Some(q) == parent {
                        continue;
                    }
                    if seen[q as usize] {
                        return Err(SolveError::InvalidDecomposition(format!(
                            "bag edges contain a cycle through bag {}",
                            q
                        )));
                    }
                    seen[q as usize] = true;
                    visited += 1;
                    parents_list.insert(q, p);
                    children_list.entry(p).or_default().push(q);
                    queue.push_back(q);
                }
            }

            if visited < n {
                let missing = seen.iter().position(|&s| !s).unwrap();
                return Err(SolveError::InvalidDecomposition(format!(
                    "bag {} is not reachable from the root",
                    missing
                )));
            }

            Ok(TreeStructure {
                root,
                parents_list,
                children_list,
            })
        }

        pub fn root(&self) -> BagId {
            self.root
        }

        /// Returns the parent of the given bag, None for the root.
        pub fn parent(&self, p: BagId) -> Option<BagId> {
            self.parents_list.get(&p).copied()
        }

        /// Returns the children of the given bag in neighbour order.
        pub fn children(&self, p: BagId) -> &[BagId] {
            self.children_list.get(&p).map(Vec::as_slice).unwrap_or(&[])
        }

        pub fn is_parent_of(&self, p: BagId, q: BagId) -> bool {
            self.parent(q) == Some(p)
        }
    }
}

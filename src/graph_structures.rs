/// A module containing the model of the input graph: vertices with dense
/// ids and optional drawing positions, undirected edges with nonnegative
/// integer costs, and adjacency queries by vertex pair.
pub mod graph_model {
    use petgraph::matrix_graph::{MatrixGraph, NodeIndex};
    use petgraph::Undirected;

    /// Vertices are petgraph matrix graph indices, dense from 0 to n-1.
    pub type Vertex = NodeIndex;

    /// Edge costs and tour values. INFINITY doubles as "no edge" and
    /// "no tour"; all cost sums in the solver saturate so that INFINITY
    /// is absorbing.
    pub type Cost = u64;
    pub const INFINITY: Cost = u64::MAX;

    /// A drawing position. Only used by the file format and the generators;
    /// the solver itself never looks at coordinates except to derive
    /// Euclidean edge costs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pos {
        pub x: i32,
        pub y: i32,
    }

    /// Per-vertex payload stored as the node weight of the matrix graph.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct VertexData {
        pub pos: Option<Pos>,
        pub name: Option<String>,
    }

    /// An undirected edge, kept with the lower vertex id first so that edge
    /// lists can be compared and deduplicated without further normalising.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Edge {
        pub a: Vertex,
        pub b: Vertex,
        pub cost: Cost,
    }

    impl Edge {
        pub fn new(a: Vertex, b: Vertex, cost: Cost) -> Edge {
            debug_assert!(a != b);
            if a.index() <= b.index() {
                Edge { a, b, cost }
            } else {
                Edge { a: b, b: a, cost }
            }
        }

        /// The (min-id, max-id) pair used for deterministic ordering.
        pub fn key(&self) -> (usize, usize) {
            (self.a.index(), self.b.index())
        }
    }

    /// The input graph. A thin wrapper around an undirected petgraph matrix
    /// graph whose edge weights are the costs, plus the metadata the file
    /// format carries.
    pub struct Graph {
        inner: MatrixGraph<VertexData, Cost, Undirected>,
        euclidean: bool,
        name: Option<String>,
    }

    impl Graph {
        pub fn new() -> Graph {
            Graph {
                inner: MatrixGraph::new_undirected(),
                euclidean: false,
                name: None,
            }
        }

        /// A graph whose omitted edge costs are derived from vertex
        /// coordinates (EDGE_WEIGHT_TYPE : EUC_2D in the file format).
        pub fn new_euclidean() -> Graph {
            Graph {
                inner: MatrixGraph::new_undirected(),
                euclidean: true,
                name: None,
            }
        }

        pub fn is_euclidean(&self) -> bool {
            self.euclidean
        }

        pub fn set_euclidean(&mut self, euclidean: bool) {
            self.euclidean = euclidean;
        }

        pub fn name(&self) -> Option<&str> {
            self.name.as_deref()
        }

        pub fn set_name(&mut self, name: &str) {
            self.name = Some(name.to_string());
        }

        /// Adds a vertex and returns its id. Ids are handed out densely in
        /// insertion order.
        pub fn add_vertex(&mut self, data: VertexData) -> Vertex {
            self.inner.add_node(data)
        }

        pub fn vertex_count(&self) -> usize {
            self.inner.node_count()
        }

        pub fn edge_count(&self) -> usize {
            self.inner.edge_count()
        }

        pub fn vertices(&self) -> impl Iterator<Item = Vertex> {
            (0..self.inner.node_count()).map(Vertex::new)
        }

        pub fn position(&self, v: Vertex) -> Option<Pos> {
            self.inner.node_weight(v).pos
        }

        pub fn vertex_name(&self, v: Vertex) -> Option<&str> {
            self.inner.node_weight(v).name.as_deref()
        }

        /// The integer Euclidean cost between two placed vertices, measured
        /// in tens of pixels as the file format defines it. None if either
        /// vertex has no position.
        pub fn euclidean_cost(&self, a: Vertex, b: Vertex) -> Option<Cost> {
            let pa = self.position(a)?;
            let pb = self.position(b)?;
            let dx = f64::from(pa.x - pb.x);
            let dy = f64::from(pa.y - pb.y);
            Some(((dx * dx + dy * dy).sqrt() / 10.0) as Cost)
        }

        /// Inserts an undirected edge. Loops are rejected and between any
        /// two vertices only the first inserted edge counts; parallel edges
        /// are dropped. A cost of None asks for the Euclidean cost, which
        /// requires both endpoints to be placed. Returns whether the edge
        /// was inserted.
        pub fn add_edge(&mut self, a: Vertex, b: Vertex, cost: Option<Cost>) -> bool {
            if a == b || self.inner.has_edge(a, b) {
                return false;
            }
            let cost = match cost {
                Some(c) => c,
                None => match self.euclidean_cost(a, b) {
                    Some(c) => c,
                    None => return false,
                },
            };
            self.inner.add_edge(a, b, cost);
            true
        }

        pub fn has_edge(&self, a: Vertex, b: Vertex) -> bool {
            a != b && self.inner.has_edge(a, b)
        }

        /// Returns the cost of the edge between a and b, or INFINITY if the
        /// graph has no such edge.
        pub fn cost(&self, a: Vertex, b: Vertex) -> Cost {
            if self.has_edge(a, b) {
                *self.inner.edge_weight(a, b)
            } else {
                INFINITY
            }
        }

        /// All edges of the graph, lower id first, ordered by (min-id, max-id).
        pub fn edges(&self) -> Vec<Edge> {
            let n = self.vertex_count();
            let mut edges = Vec::with_capacity(self.edge_count());
            for i in 0..n {
                for j in (i + 1)..n {
                    let (a, b) = (Vertex::new(i), Vertex::new(j));
                    if self.inner.has_edge(a, b) {
                        edges.push(Edge::new(a, b, *self.inner.edge_weight(a, b)));
                    }
                }
            }
            edges
        }

        /// All edges with both endpoints in the given vertex list, ascending
        /// by cost with ties broken by (min-id, max-id). This is the edge
        /// order the edge selector and the reconstruction both rely on.
        pub fn edges_within(&self, vertices: &[Vertex]) -> Vec<Edge> {
            let mut edges = vec![];
            for (i, &v) in vertices.iter().enumerate() {
                for &w in vertices.iter().skip(i + 1) {
                    if self.has_edge(v, w) {
                        edges.push(Edge::new(v, w, self.cost(v, w)));
                    }
                }
            }
            edges.sort_by_key(|e| (e.cost, e.key()));
            edges
        }
    }
}
